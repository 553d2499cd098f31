//! Clap derive structures for the `sitegrid` CLI.
//!
//! Defines the command tree, global flags, and shared types. Only clap
//! and clap_complete are used here so `build.rs` can include this file.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// sitegrid -- browse and edit sites on the zone grid
#[derive(Debug, Parser)]
#[command(
    name = "sitegrid",
    version,
    about = "Browse and edit sites on the zone grid",
    long_about = "Keeps a local cache of the remote site table, projects it through\n\
        zone / star / status / phase filters, and commits status edits\n\
        optimistically with rollback on failure.",
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
    /// Remote server root (overrides config)
    #[arg(long, short = 'u', env = "SITEGRID_URL", global = true)]
    pub url: Option<String>,

    /// Remote table name
    #[arg(long, env = "SITEGRID_TABLE", global = true)]
    pub table: Option<String>,

    /// Remote API key
    #[arg(long, env = "SITEGRID_API_KEY", global = true, hide_env = true)]
    pub api_key: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "SITEGRID_OUTPUT",
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

    /// Use the local cache only; never contact the remote store
    #[arg(long, env = "SITEGRID_OFFLINE", global = true)]
    pub offline: bool,

    /// Request timeout in seconds (overrides config)
    #[arg(long, env = "SITEGRID_TIMEOUT", global = true)]
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
    /// List, inspect and edit sites
    #[command(alias = "s")]
    Sites(SitesArgs),

    /// Manage the local highlight set
    #[command(alias = "hl")]
    Highlight(HighlightArgs),

    /// Inspect or clear the local site cache
    Cache(CacheArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Sites ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SitesArgs {
    #[command(subcommand)]
    pub command: SitesCommand,
}

#[derive(Debug, Subcommand)]
pub enum SitesCommand {
    /// Project the site table through the filters and list the markers
    #[command(alias = "ls")]
    List(SitesListArgs),

    /// Show the edit panel for one site
    Show {
        /// Site ID
        id: i64,
    },

    /// Change a site's status, phase or notes
    Edit(SitesEditArgs),
}

#[derive(Debug, Args)]
pub struct SitesListArgs {
    /// Zone number or roman numeral ("all" for every zone)
    #[arg(long, short = 'z')]
    pub zone: Option<String>,

    /// Exact star rating (1-5, "all")
    #[arg(long)]
    pub stars: Option<String>,

    /// Status token (VERDE/GIALLO/ROSSO/BIANCO, storage names, "highlighted", "all")
    #[arg(long)]
    pub status: Option<String>,

    /// Phase number, "none" or "all"
    #[arg(long)]
    pub phase: Option<String>,

    /// Zoom level used for marker radii (overrides config)
    #[arg(long)]
    pub zoom: Option<f64>,
}

#[derive(Debug, Args)]
pub struct SitesEditArgs {
    /// Site ID
    pub id: i64,

    /// New status token
    #[arg(long)]
    pub status: Option<String>,

    /// New phase (kept only for in-progress statuses)
    #[arg(long, conflicts_with = "clear_phase")]
    pub phase: Option<u8>,

    /// Remove the phase
    #[arg(long)]
    pub clear_phase: bool,

    /// Replace the notes ("" clears them)
    #[arg(long)]
    pub notes: Option<String>,
}

// ── Highlight ────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct HighlightArgs {
    #[command(subcommand)]
    pub command: HighlightCommand,
}

#[derive(Debug, Subcommand)]
pub enum HighlightCommand {
    /// Flip a site's highlight
    Toggle {
        /// Site ID
        id: i64,
    },

    /// List highlighted site IDs
    #[command(alias = "ls")]
    List,
}

// ── Cache ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommand,
}

#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// Show snapshot age, freshness and size
    Status,

    /// Delete the cached snapshot (highlights are kept)
    Clear,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create the config file
    Init {
        /// Remote server root (prompted for when omitted)
        #[arg(long)]
        url: Option<String>,

        /// Remote table name
        #[arg(long)]
        table: Option<String>,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Display current resolved configuration
    Show,

    /// Print the config file path
    Path,

    /// Store the remote API key in the system keyring
    SetApiKey,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
