//! isapi-open-door — door actuator entry point.

use clap::Parser;

use isapi_door_cli::{logging, open_door_cmd, OpenDoorCli};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = OpenDoorCli::parse();
    logging::init(&cli.flags.log_level);

    let mut stdout = std::io::stdout();
    let opened = open_door_cmd::run(&cli, &mut stdout).await?;

    // 0 = opened, 1 = every attempt failed
    if !opened {
        std::process::exit(1);
    }
    Ok(())
}
