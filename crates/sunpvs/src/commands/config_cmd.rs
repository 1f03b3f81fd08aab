//! Config subcommand handlers.

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display, masking the serial suffixes.
fn format_config_redacted(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);
    let _ = writeln!(out, "legacy_timeout = {}", cfg.defaults.legacy_timeout);
    let _ = writeln!(out, "check_auth_endpoint = {}", cfg.defaults.check_auth_endpoint);

    for (name, p) in &cfg.profiles {
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "host = \"{}\"", p.host);
        if p.serial_suffix.is_some() {
            let _ = writeln!(out, "serial_suffix = \"****\"");
        }
        if let Some(ref env) = p.serial_suffix_env {
            let _ = writeln!(out, "serial_suffix_env = \"{env}\"");
        }
        if p.fallback_serial_suffix.is_some() {
            let _ = writeln!(out, "fallback_serial_suffix = \"****\"");
        }
        if let Some(mode) = p.mode {
            let _ = writeln!(out, "mode = \"{mode}\"");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        if let Some(timeout) = p.legacy_timeout {
            let _ = writeln!(out, "legacy_timeout = {timeout}");
        }
        if let Some(check) = p.check_auth_endpoint {
            let _ = writeln!(out, "check_auth_endpoint = {check}");
        }
    }

    out
}

/// Redacted copy for structured output.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        for secret in [&mut profile.serial_suffix, &mut profile.fallback_serial_suffix] {
            if secret.is_some() {
                *secret = Some("****".into());
            }
        }
    }
    cfg
}

fn available_profiles(cfg: &Config) -> String {
    if cfg.profiles.is_empty() {
        "(none)".into()
    } else {
        cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            let format = config::output_format(global, &cfg);
            let out = output::render_single(format, &redacted(&cfg), format_config_redacted, |_| {
                "config".into()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Init: profile from global flags ─────────────────────────
        ConfigCommand::Init { force } => {
            let mut cfg = config::load_config()?;
            let name = config::active_profile_name(global, &cfg);

            let host = global.host.as_deref().ok_or_else(|| CliError::Validation {
                field: "host".into(),
                reason: "pass --host <address> to create a profile".into(),
            })?;
            sunpvs_config::validate_host(host)?;

            if cfg.profiles.contains_key(&name) && !force {
                return Err(CliError::Validation {
                    field: "profile".into(),
                    reason: format!("'{name}' already exists, pass --force to replace it"),
                });
            }

            let profile = Profile {
                serial_suffix: global.serial_suffix.as_ref().map(|s| s.trim().to_owned()),
                mode: global.mode,
                timeout: global.timeout,
                ..Profile::new(host.trim())
            };
            cfg.profiles.insert(name.clone(), profile);
            if cfg.default_profile.is_none() || cfg.profiles.len() == 1 {
                cfg.default_profile = Some(name.clone());
            }

            let path = config::save_config(&cfg)?;
            eprintln!("✓ Profile '{name}' written to {}", path.display());
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config()?;
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: sunpvs --host <address> config init");
            } else {
                for (name, profile) in &cfg.profiles {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}\t{}", profile.host);
                }
            }
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config()?;

            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: available_profiles(&cfg),
                    name,
                });
            }

            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            eprintln!("✓ Default profile set to '{name}'");
            Ok(())
        }
    }
}
