//! Command-line argument definitions shared by both binaries.

use clap::{Args, Parser};

use isapi_door::{ClientConfig, ConnectionTarget, Credentials, Scheme, DEFAULT_TIMEOUT_SECS};

/// Positional device arguments: `<ip> <port> <username> <password>`.
#[derive(Args, Debug, Clone)]
pub struct DeviceArgs {
    /// Device IP address or hostname.
    pub ip: String,

    /// Device HTTP(S) port.
    pub port: u16,

    /// Username for digest authentication.
    pub username: String,

    /// Password for digest authentication.
    pub password: String,
}

impl DeviceArgs {
    pub fn target(&self, scheme: Scheme) -> ConnectionTarget {
        ConnectionTarget::new(self.ip.clone(), self.port, scheme)
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.username.clone(), self.password.clone())
    }
}

/// Optional flags shared by both tools.
#[derive(Args, Debug, Clone)]
pub struct CommonFlags {
    /// Use HTTPS instead of HTTP.
    #[arg(long)]
    pub https: bool,

    /// Accept self-signed device certificates.
    #[arg(long)]
    pub insecure: bool,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Output results as JSON (machine-readable).
    #[arg(long)]
    pub json: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl CommonFlags {
    pub fn scheme(&self) -> Scheme {
        if self.https {
            Scheme::Https
        } else {
            Scheme::Http
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::resolve(Some(self.timeout), self.insecure)
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "isapi-probe",
    about = "Check which access-control endpoints an ISAPI device supports",
    version,
    after_help = "Example: isapi-probe 192.168.1.100 80 admin mypassword"
)]
pub struct ProbeCli {
    #[command(flatten)]
    pub device: DeviceArgs,

    /// Door number used for the door-status check.
    #[arg(long, default_value_t = 1)]
    pub door: u32,

    #[command(flatten)]
    pub flags: CommonFlags,
}

#[derive(Parser, Debug)]
#[command(
    name = "isapi-open-door",
    about = "Remotely open a door on an ISAPI access controller",
    version,
    after_help = "Example: isapi-open-door 192.168.1.100 80 admin mypassword 1"
)]
pub struct OpenDoorCli {
    #[command(flatten)]
    pub device: DeviceArgs,

    /// Door number to open.
    pub door_number: u32,

    #[command(flatten)]
    pub flags: CommonFlags,
}
