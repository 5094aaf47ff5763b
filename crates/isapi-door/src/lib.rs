//! isapi-door — probe and actuate ISAPI door-access controllers.
//!
//! Every request carries its own digest-auth handshake; nothing is cached
//! between calls.

pub mod client;
pub mod config;
pub mod digest;
pub mod door;
pub mod probe;
pub mod types;
pub mod xml;

pub use client::IsapiClient;
pub use config::{ClientConfig, DEFAULT_TIMEOUT_SECS};
pub use door::{open_door, open_door_with, OpenDoorOutcome, Stage};
pub use probe::{ProbeReport, ProbeResult};
pub use types::*;
