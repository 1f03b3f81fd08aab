//! Shared configuration for the sunpvs CLI and other front ends.
//!
//! TOML profiles layered with `SUNPVS_*` environment variables, serial
//! suffix lookup, and translation to `sunpvs_core::ClientConfig`. The CLI
//! adds flag-aware overrides on top.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use sunpvs_core::{ClientConfig, ModePreference};

/// Prefix for environment overrides. Nested keys use `__`, e.g.
/// `SUNPVS_DEFAULTS__TIMEOUT=45`.
pub const ENV_PREFIX: &str = "SUNPVS_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is named on the command line.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named supervisor profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Look up `name`, or the default profile when `name` is `None`.
    pub fn profile<'a>(&'a self, name: Option<&'a str>) -> Result<(&'a str, &'a Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get(name)
            .map(|profile| (name, profile))
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    /// Probe and LocalAPI timeout, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Legacy CGI timeout, in seconds. `DeviceList` is slow on old firmware.
    #[serde(default = "default_legacy_timeout")]
    pub legacy_timeout: u64,

    #[serde(default = "default_check_auth_endpoint")]
    pub check_auth_endpoint: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            timeout: default_timeout(),
            legacy_timeout: default_legacy_timeout(),
            check_auth_endpoint: default_check_auth_endpoint(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_legacy_timeout() -> u64 {
    120
}
fn default_check_auth_endpoint() -> bool {
    true
}

/// A named supervisor profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Supervisor address (e.g., "192.168.1.10" or "http://pvs.local").
    pub host: String,

    /// Last five characters of the PVS serial (plaintext).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_suffix: Option<String>,

    /// Environment variable name containing the serial suffix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_suffix_env: Option<String>,

    /// Used only when neither the supervisor nor the environment supplies one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_serial_suffix: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<ModePreference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy_timeout: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_auth_endpoint: Option<bool>,
}

impl Profile {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "sunpvs", "sunpvs").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("sunpvs");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file. A missing file contributes nothing.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Host validation ─────────────────────────────────────────────────

/// Accept an IPv4 address or an RFC 1123 hostname, optionally wrapped in
/// an `http(s)://` scheme, port, and trailing path.
pub fn validate_host(host: &str) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::Validation {
        field: "host".into(),
        reason: format!("{reason}: '{host}'"),
    };

    let bare = bare_host(host);
    if bare.is_empty() {
        return Err(invalid("host is empty"));
    }
    if bare.parse::<Ipv4Addr>().is_ok() {
        return Ok(());
    }
    if bare.len() > 253 {
        return Err(invalid("hostname longer than 253 characters"));
    }

    let labels: Vec<&str> = bare.split('.').collect();
    for label in &labels {
        let valid = (1..=63).contains(&label.len())
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
            && !label.starts_with('-')
            && !label.ends_with('-');
        if !valid {
            return Err(invalid("not an IPv4 address or hostname"));
        }
    }

    // An all-numeric last label is a malformed address, not a hostname.
    if labels
        .last()
        .is_some_and(|tld| tld.chars().all(|c| c.is_ascii_digit()))
    {
        return Err(invalid("not a valid IPv4 address"));
    }
    Ok(())
}

fn bare_host(host: &str) -> &str {
    let host = host.trim();
    let host = host
        .strip_prefix("http://")
        .or_else(|| host.strip_prefix("https://"))
        .unwrap_or(host);
    let host = host.split('/').next().unwrap_or(host);
    host.rsplit_once(':').map_or(host, |(name, _port)| name)
}

// ── Credential resolution (without CLI flags) ───────────────────────

/// `SUNPOWER_SERIAL_SUFFIX`, if set and non-blank.
pub fn env_serial_suffix() -> Option<SecretString> {
    sunpvs_core::env_credential()
}

/// The profile's own serial suffix: its `serial_suffix_env` variable first,
/// then the plaintext value.
pub fn resolve_serial_suffix(profile: &Profile) -> Option<SecretString> {
    if let Some(ref env_name) = profile.serial_suffix_env {
        if let Ok(val) = std::env::var(env_name) {
            if !val.trim().is_empty() {
                return Some(SecretString::from(val.trim().to_owned()));
            }
        }
    }

    profile
        .serial_suffix
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| SecretString::from(s.to_owned()))
}

/// Build a `ClientConfig` from a profile, without CLI flag overrides.
pub fn profile_to_client_config(
    profile: &Profile,
    defaults: &Defaults,
    env_suffix: Option<SecretString>,
) -> Result<ClientConfig, ConfigError> {
    validate_host(&profile.host)?;

    let timeout = profile.timeout.unwrap_or(defaults.timeout);
    let legacy_timeout = profile.legacy_timeout.unwrap_or(defaults.legacy_timeout);
    for (field, secs) in [("timeout", timeout), ("legacy_timeout", legacy_timeout)] {
        if secs == 0 {
            return Err(ConfigError::Validation {
                field: field.into(),
                reason: "must be at least 1 second".into(),
            });
        }
    }

    let mut config = ClientConfig::new(profile.host.trim());
    config.credential = resolve_serial_suffix(profile);
    config.env_credential = env_suffix;
    config.fallback_credential = profile
        .fallback_serial_suffix
        .clone()
        .map(SecretString::from);
    config.mode = profile.mode.unwrap_or_default();
    config.timeout = Duration::from_secs(timeout);
    config.legacy_timeout = Duration::from_secs(legacy_timeout);
    config.check_auth_endpoint = profile
        .check_auth_endpoint
        .unwrap_or(defaults.check_auth_endpoint);
    Ok(config)
}
