// ── Core error types ──
//
// User-facing errors from sunpvs-core. Consumers see what went wrong at
// the supervisor level, not raw HTTP or JSON failures. The
// `From<sunpvs_api::Error>` impl translates transport-layer errors into
// these variants; `kind()` folds everything into the two classes callers
// branch on.

use sunpvs_api::ErrorKind;
use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to PVS at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error(
        "Missing serial suffix for {host}. Provide the last 5 characters of the PVS serial \
         explicitly or via SUNPOWER_SERIAL_SUFFIX"
    )]
    MissingCredential { host: String },

    /// `timeout_secs` is `None` when the limit is not known at the failure site.
    #[error("PVS request timed out{}", after_secs(.timeout_secs))]
    Timeout { timeout_secs: Option<u64> },

    #[error("Client is not connected -- call connect() first")]
    NotConnected,

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Data errors ──────────────────────────────────────────────────
    /// The response arrived but did not have the expected shape.
    #[error("Unexpected response from PVS: {message}")]
    Parse { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// Classify this error as a connection or parse failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Parse { .. } => ErrorKind::Parse,
            _ => ErrorKind::Connection,
        }
    }
}

#[allow(clippy::ref_option)]
fn after_secs(timeout_secs: &Option<u64>) -> String {
    timeout_secs.map(|s| format!(" after {s}s")).unwrap_or_default()
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<sunpvs_api::Error> for CoreError {
    fn from(err: sunpvs_api::Error) -> Self {
        match err {
            sunpvs_api::Error::InvalidCredentials
            | sunpvs_api::Error::SessionExpired { .. }
            | sunpvs_api::Error::AuthRetriesExhausted { .. } => CoreError::AuthenticationFailed {
                message: err.to_string(),
            },
            sunpvs_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: None }
                } else if e.is_decode() {
                    CoreError::Parse {
                        message: e.to_string(),
                    }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            sunpvs_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid host URL: {e}"),
            },
            sunpvs_api::Error::Timeout { timeout_secs } => CoreError::Timeout {
                timeout_secs: Some(timeout_secs),
            },
            sunpvs_api::Error::Http { status, message } => CoreError::Api {
                message: format!("HTTP {status}: {message}"),
                status: Some(status),
            },
            sunpvs_api::Error::Deserialization { message, body: _ } => {
                CoreError::Parse { message }
            }
            sunpvs_api::Error::MissingField { key, body: _ } => CoreError::Parse {
                message: format!("missing `{key}` in response"),
            },
        }
    }
}
