//! Clap derive structures for the `bigip-license` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// bigip-license -- converge the license of a BIG-IP device
#[derive(Debug, Parser)]
#[command(
    name = "bigip-license",
    version,
    about = "Install, refresh, and remove BIG-IP licenses",
    long_about = "Converges the license of a single BIG-IP or BIG-IQ device to a desired state.\n\n\
        Issuance negotiates with the F5 activation service over SOAP; removal\n\
        deletes the license files and reloads licensing over SSH.",
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
    /// Device profile to use
    #[arg(long, short = 'p', env = "BIGIP_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Device address or URL (overrides profile)
    #[arg(long, short = 's', env = "BIGIP_SERVER", global = true)]
    pub server: Option<String>,

    /// Administrative username (overrides profile)
    #[arg(long, short = 'u', env = "BIGIP_USERNAME", global = true)]
    pub user: Option<String>,

    /// Account password
    #[arg(long, env = "BIGIP_PASSWORD", global = true, hide_env = true)]
    pub password: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "BIGIP_OUTPUT",
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

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Skip certificate and SSH host-key validation
    #[arg(long, short = 'k', env = "BIGIP_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "BIGIP_TIMEOUT", global = true)]
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
    /// Converge the device license to a desired state
    Apply(ApplyArgs),

    /// Show the device's license activation status
    #[command(alias = "st")]
    Status,

    /// Show which activation service a registration key selects (offline)
    Endpoint(EndpointArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  APPLY
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LicenseState {
    /// Install a license unless one is already active
    Present,
    /// Remove the installed license
    Absent,
    /// Install a freshly issued license, replacing any active one
    Latest,
}

#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Desired license state
    #[arg(long, default_value = "present")]
    pub state: LicenseState,

    /// Registration key
    #[arg(long, env = "BIGIP_LICENSE_KEY")]
    pub key: String,

    /// Install this pre-issued license instead of contacting the activation service
    #[arg(long)]
    pub license_file: Option<PathBuf>,

    /// Use this dossier instead of generating one on the device
    #[arg(long)]
    pub dossier_file: Option<PathBuf>,

    /// Alternate activation service descriptor (WSDL path or URL)
    #[arg(long)]
    pub service_descriptor: Option<String>,

    /// JSON file of registrant contact details
    #[arg(long)]
    pub metadata_file: Option<PathBuf>,

    #[command(flatten)]
    pub contact: ContactArgs,

    /// Fail when license removal or shell restoration cannot be confirmed
    #[arg(long)]
    pub strict: bool,
}

/// Registrant contact details; each flag overrides the profile and metadata file.
#[derive(Debug, Default, Args)]
pub struct ContactArgs {
    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub first_name: Option<String>,

    #[arg(long)]
    pub last_name: Option<String>,

    #[arg(long)]
    pub company: Option<String>,

    #[arg(long)]
    pub phone: Option<String>,

    #[arg(long)]
    pub job_title: Option<String>,

    #[arg(long)]
    pub address: Option<String>,

    #[arg(long)]
    pub city: Option<String>,

    #[arg(long)]
    pub state_province: Option<String>,

    #[arg(long)]
    pub postal_code: Option<String>,

    #[arg(long)]
    pub country: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ENDPOINT
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct EndpointArgs {
    /// Registration key
    pub key: String,
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
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Set a configuration value on the active profile or in [defaults]
    Set {
        /// Profile key (e.g., "server", "contact.email") or "defaults.<key>"
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store a password in the system keyring
    SetPassword {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,
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
