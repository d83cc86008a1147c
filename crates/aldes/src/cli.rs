//! Clap derive structures for the `aldes` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

use aldes_core::{Temperature, ThermostatId};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// aldes -- control Aldes heat pumps from the command line
#[derive(Debug, Parser)]
#[command(
    name = "aldes",
    version,
    about = "Monitor and control Aldes AldesConnect heat pumps",
    long_about = "Reads product state from the AldesConnect cloud, switches air modes,\n\
        changes thermostat setpoints, and watches for changes.",
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
    /// Account profile to use
    #[arg(long, short = 'p', env = "ALDES_PROFILE", global = true)]
    pub profile: Option<String>,

    /// AldesConnect login (overrides profile)
    #[arg(long, short = 'u', env = "ALDES_USERNAME", global = true)]
    pub username: Option<String>,

    /// AldesConnect password
    #[arg(long, env = "ALDES_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// API host (overrides profile)
    #[arg(long, env = "ALDES_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "ALDES_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds
    #[arg(long, env = "ALDES_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
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

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List products attached to the account
    #[command(alias = "p")]
    Products,

    /// List thermostats of the primary product
    #[command(alias = "t")]
    Thermostats,

    /// Show the air mode table
    Modes,

    /// Read or change the air mode
    Mode(ModeArgs),

    /// Change a thermostat setpoint
    Thermostat(ThermostatArgs),

    /// Poll continuously and print change events
    Watch(WatchArgs),

    /// Manage configuration profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Mode ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ModeArgs {
    #[command(subcommand)]
    pub command: ModeCommand,
}

#[derive(Debug, Subcommand)]
pub enum ModeCommand {
    /// Show the current mode of the primary product
    Get,

    /// Switch the primary product to another mode
    Set {
        /// Mode code (A-I) or name ("heat eco")
        mode: String,
    },
}

// ── Thermostat ───────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ThermostatArgs {
    #[command(subcommand)]
    pub command: ThermostatCommand,
}

#[derive(Debug, Subcommand)]
pub enum ThermostatCommand {
    /// Set the target temperature of one thermostat
    Set {
        /// Thermostat id (see `aldes thermostats`)
        id: ThermostatId,

        /// Target temperature in °C (e.g. 21 or 21.5)
        temperature: Temperature,
    },
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Poll period in seconds (overrides profile)
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,

    /// List configured profiles
    Profiles,

    /// Read a password from stdin and store it in the system keyring
    SetPassword,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
