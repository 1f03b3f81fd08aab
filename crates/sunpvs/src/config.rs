//! CLI configuration: a thin wrapper around `sunpvs_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--host, --serial-suffix, etc.).

use std::time::Duration;

use clap::ValueEnum;
use secrecy::SecretString;

use sunpvs_core::ClientConfig;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use sunpvs_config::{Config, Profile, config_path, env_serial_suffix, load_config, save_config};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// `--output` if given, else the config default, else table.
pub fn output_format(global: &GlobalOpts, config: &Config) -> OutputFormat {
    global.output.unwrap_or_else(|| {
        OutputFormat::from_str(&config.defaults.output, true).unwrap_or(OutputFormat::Table)
    })
}

/// The host to probe: flag/env first, then the active profile.
pub fn resolve_host(global: &GlobalOpts, config: &Config) -> Result<String, CliError> {
    if let Some(ref host) = global.host {
        sunpvs_config::validate_host(host)?;
        return Ok(host.trim().to_owned());
    }
    let name = active_profile_name(global, config);
    match config.profiles.get(&name) {
        Some(profile) => {
            sunpvs_config::validate_host(&profile.host)?;
            Ok(profile.host.trim().to_owned())
        }
        None => Err(missing_host(global, config, &name)),
    }
}

/// Build a `ClientConfig` from the config file, profile, and CLI overrides.
///
/// CLI flag overrides take priority over profile values.
pub fn build_client_config(global: &GlobalOpts, config: &Config) -> Result<ClientConfig, CliError> {
    let name = active_profile_name(global, config);
    let env_suffix = env_serial_suffix();

    let mut client = match (config.profiles.get(&name), global.host.as_deref()) {
        (Some(profile), host) => {
            let mut client =
                sunpvs_config::profile_to_client_config(profile, &config.defaults, env_suffix)?;
            if let Some(host) = host {
                sunpvs_config::validate_host(host)?;
                client.host = host.trim().to_owned();
            }
            client
        }
        // No profile -- build from flags / env vars alone
        (None, Some(host)) => {
            let profile = Profile::new(host);
            sunpvs_config::profile_to_client_config(&profile, &config.defaults, env_suffix)?
        }
        (None, None) => return Err(missing_host(global, config, &name)),
    };

    if let Some(ref suffix) = global.serial_suffix {
        client.credential = Some(SecretString::from(suffix.trim().to_owned()));
    }
    if let Some(mode) = global.mode {
        client.mode = mode;
    }
    if let Some(secs) = global.timeout {
        if secs == 0 {
            return Err(CliError::Validation {
                field: "timeout".into(),
                reason: "must be at least 1 second".into(),
            });
        }
        client.timeout = Duration::from_secs(secs);
    }

    Ok(client)
}

/// A profile was named explicitly but doesn't exist, or nothing was
/// configured at all.
fn missing_host(global: &GlobalOpts, config: &Config, name: &str) -> CliError {
    if global.profile.is_some() {
        let available: Vec<_> = config.profiles.keys().cloned().collect();
        return CliError::ProfileNotFound {
            name: name.into(),
            available: if available.is_empty() {
                "(none)".into()
            } else {
                available.join(", ")
            },
        };
    }
    CliError::NoConfig {
        path: config_path().display().to_string(),
    }
}
