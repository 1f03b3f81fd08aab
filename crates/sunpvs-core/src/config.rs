// ── Runtime connection configuration ──
//
// These types describe *how* to reach one PVS. They carry credential data
// and connection tuning, but never touch disk. The CLI (or any other
// collaborator) constructs a `ClientConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use sunpvs_api::RetryPolicy;
use sunpvs_api::transport::{DEFAULT_LEGACY_TIMEOUT, DEFAULT_TIMEOUT};

/// Which API surface to use.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum ModePreference {
    /// Let the capability probe decide.
    #[default]
    Auto,
    /// Always use the LocalAPI, even if the probe disagrees.
    #[strum(to_string = "localapi", serialize = "local-api")]
    #[serde(rename = "localapi", alias = "local-api")]
    LocalApi,
    /// Always use the legacy CGI; no probe is sent.
    Legacy,
}

/// Configuration for connecting to a single PVS.
///
/// Built by the CLI, passed to [`PvsClient`](crate::PvsClient). Core never
/// reads config files.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Supervisor address: IP, hostname, or full `http://` URL.
    pub host: String,
    /// Serial suffix supplied by the user. Wins over every other source.
    pub credential: Option<SecretString>,
    /// Serial suffix taken from the environment (`SUNPOWER_SERIAL_SUFFIX`).
    pub env_credential: Option<SecretString>,
    /// Last-resort serial suffix.
    pub fallback_credential: Option<SecretString>,
    pub mode: ModePreference,
    /// Timeout for the probe and LocalAPI requests.
    pub timeout: Duration,
    /// Timeout for legacy CGI commands.
    pub legacy_timeout: Duration,
    pub retry: RetryPolicy,
    /// Confirm `/auth` exists before trusting the firmware build number.
    pub check_auth_endpoint: bool,
}

impl ClientConfig {
    /// Defaults for `host`, with no credential sources set.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            credential: None,
            env_credential: None,
            fallback_credential: None,
            mode: ModePreference::default(),
            timeout: DEFAULT_TIMEOUT,
            legacy_timeout: DEFAULT_LEGACY_TIMEOUT,
            retry: RetryPolicy::default(),
            check_auth_endpoint: true,
        }
    }

    pub fn with_credential(mut self, credential: SecretString) -> Self {
        self.credential = Some(credential);
        self
    }

    pub fn with_mode(mut self, mode: ModePreference) -> Self {
        self.mode = mode;
        self
    }
}
