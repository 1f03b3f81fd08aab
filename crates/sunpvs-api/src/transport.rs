// Shared transport configuration for building reqwest::Client instances.
//
// The prober, LocalAPI and legacy clients all go through this module so
// timeouts and user agent stay in one place.

use std::time::Duration;

use crate::error::Error;

/// Default per-request timeout for probe and LocalAPI calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Legacy CGI commands can take well over a minute on older supervisors.
pub const DEFAULT_LEGACY_TIMEOUT: Duration = Duration::from_secs(120);

const USER_AGENT: &str = concat!("sunpvs/", env!("CARGO_PKG_VERSION"));

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Timeout applied to probe and LocalAPI requests.
    pub timeout: Duration,
    /// Timeout applied to legacy `dl_cgi` commands.
    pub legacy_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            legacy_timeout: DEFAULT_LEGACY_TIMEOUT,
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` using the short timeout.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        Self::build(self.timeout)
    }

    /// Build a `reqwest::Client` using the legacy command timeout.
    pub fn build_legacy_client(&self) -> Result<reqwest::Client, Error> {
        Self::build(self.legacy_timeout)
    }

    fn build(timeout: Duration) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(Error::Transport)
    }
}

/// Build the supervisor base URL from a bare host or a full URL.
///
/// `192.168.1.10` and `pvs.local:8080` become `http://…/`; anything that
/// already carries a scheme is parsed as-is.
pub fn base_url(host: &str) -> Result<url::Url, Error> {
    let host = host.trim().trim_end_matches('/');
    let raw = if host.contains("://") {
        format!("{host}/")
    } else {
        format!("http://{host}/")
    };
    Ok(url::Url::parse(&raw)?)
}
