//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use sunpvs_config::ConfigError;
use sunpvs_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const PROTOCOL: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not connect to PVS at {url}")]
    #[diagnostic(
        code(sunpvs::connection_failed),
        help(
            "Check that the supervisor is powered and reachable on the LAN.\n\
             Reason: {reason}\n\
             Try: sunpvs probe --host <address>"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error(
        "PVS returned an error{}: {message}",
        .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
    )]
    #[diagnostic(code(sunpvs::api_error))]
    ApiError { message: String, status: Option<u16> },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(sunpvs::auth_failed),
        help(
            "The LocalAPI password is the last 5 characters of the PVS serial.\n\
             Pass it with --serial-suffix or set SUNPOWER_SERIAL_SUFFIX."
        )
    )]
    AuthFailed { message: String },

    #[error("No serial suffix available for {host}")]
    #[diagnostic(
        code(sunpvs::no_credentials),
        help(
            "The supervisor did not report its serial.\n\
             Pass --serial-suffix, set SUNPOWER_SERIAL_SUFFIX, or add serial_suffix to your profile."
        )
    )]
    NoCredentials { host: String },

    // ── Data ─────────────────────────────────────────────────────────

    #[error("Unexpected response from PVS: {message}")]
    #[diagnostic(
        code(sunpvs::parse),
        help("Re-run with -vv to see the raw requests. Older firmware may need --mode legacy.")
    )]
    Parse { message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(sunpvs::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(sunpvs::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: sunpvs --host <address> config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No PVS host configured")]
    #[diagnostic(
        code(sunpvs::no_config),
        help(
            "Pass --host <address>, set SUNPVS_HOST, or create a profile with:\n\
             sunpvs --host <address> config init\n\
             Config file: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(sunpvs::config))]
    Config(Box<figment::Error>),

    // ── Timeout ──────────────────────────────────────────────────────

    #[error("Request timed out{}", after_secs(.seconds))]
    #[diagnostic(
        code(sunpvs::timeout),
        help("Increase the timeout with --timeout or check the supervisor's network link.")
    )]
    Timeout { seconds: Option<u64> },

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to write config: {0}")]
    #[diagnostic(code(sunpvs::config))]
    ConfigWrite(#[from] toml::ser::Error),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

#[allow(clippy::ref_option)]
fn after_secs(seconds: &Option<u64>) -> String {
    seconds.map(|s| format!(" after {s}s")).unwrap_or_default()
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::ApiError { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Parse { .. } => exit_code::PROTOCOL,
            Self::Validation { .. }
            | Self::ProfileNotFound { .. }
            | Self::NoConfig { .. }
            | Self::Config(_) => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },

            CoreError::MissingCredential { host } => CliError::NoCredentials { host },

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            CoreError::NotConnected => CliError::ConnectionFailed {
                url: "(not connected)".into(),
                reason: "client was never initialized".into(),
            },

            CoreError::Api { message, status } => CliError::ApiError { message, status },

            CoreError::Parse { message } => CliError::Parse { message },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::UnknownProfile { name } => CliError::ProfileNotFound {
                name,
                available: "(none)".into(),
            },
            ConfigError::Serialization(e) => CliError::ConfigWrite(e),
            ConfigError::Figment(e) => CliError::Config(e),
            ConfigError::Io(e) => CliError::Io(e),
        }
    }
}
