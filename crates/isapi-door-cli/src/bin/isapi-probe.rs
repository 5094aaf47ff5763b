//! isapi-probe — capability check entry point.

use clap::Parser;

use isapi_door_cli::{logging, probe_cmd, ProbeCli};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = ProbeCli::parse();
    logging::init(&cli.flags.log_level);

    let mut stdout = std::io::stdout();
    probe_cmd::run(&cli, &mut stdout).await
}
