//! Command-line front-end for the ISAPI door tools.

pub mod args;
pub mod logging;
pub mod open_door_cmd;
pub mod probe_cmd;

pub use args::{OpenDoorCli, ProbeCli};
