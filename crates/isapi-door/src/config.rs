//! Client configuration.

use std::time::Duration;

/// Per-request timeout when none is given.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// How the HTTP client talks to the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Timeout for each request, connection included.
    pub timeout: Duration,
    /// Accept self-signed or otherwise invalid TLS certificates.
    pub accept_invalid_certs: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            accept_invalid_certs: false,
        }
    }
}

impl ClientConfig {
    /// Resolve the config from optional command-line overrides.
    pub fn resolve(timeout_secs: Option<u64>, insecure: bool) -> Self {
        let timeout = timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        Self {
            timeout,
            accept_invalid_certs: insecure,
        }
    }
}
