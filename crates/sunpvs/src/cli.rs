//! Clap derive structures for the `sunpvs` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

use sunpvs_core::{DeviceKind, ModePreference};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// sunpvs -- read telemetry from a SunPower PVS supervisor
#[derive(Debug, Parser)]
#[command(
    name = "sunpvs",
    version,
    about = "Read SunPower PVS telemetry from the command line",
    long_about = "Talks to a SunPower PVS supervisor on the local network.\n\n\
        Uses the session-authenticated LocalAPI on firmware that supports it,\n\
        and falls back to the legacy dl_cgi commands on older builds.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Supervisor profile to use
    #[arg(long, short = 'p', env = "SUNPVS_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Supervisor address or URL (overrides profile)
    #[arg(long, short = 'H', env = "SUNPVS_HOST", global = true)]
    pub host: Option<String>,

    /// Last 5 characters of the PVS serial (LocalAPI password)
    #[arg(long, global = true)]
    pub serial_suffix: Option<String>,

    /// API surface: auto, localapi, or legacy
    #[arg(long, global = true)]
    pub mode: Option<ModePreference>,

    /// Output format (defaults to the config file's choice, then table)
    #[arg(long, short = 'o', env = "SUNPVS_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds (probe and LocalAPI)
    #[arg(long, env = "SUNPVS_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output Enum ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check whether the supervisor supports the LocalAPI
    Probe,

    /// List devices (supervisor, meters, inverters, storage)
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Energy storage (SunVault) status
    Ess,

    /// Network and communication status
    #[command(alias = "net")]
    Network,

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  DEVICES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct DevicesArgs {
    /// Add a virtual production meter that sums the inverters
    #[arg(long)]
    pub virtual_meter: bool,

    /// Only show one device type (pvs, meter, inverter, battery, ess, ...)
    #[arg(long = "type", short = 't', value_name = "TYPE")]
    pub kind: Option<DeviceKind>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,

    /// Display current resolved configuration
    Show,

    /// Create or update a profile from the global flags
    Init {
        /// Replace an existing profile of the same name
        #[arg(long)]
        force: bool,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
