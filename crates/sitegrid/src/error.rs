//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and distinct exit codes.

use miette::Diagnostic;
use thiserror::Error;

use sitegrid_config::ConfigError;
use sitegrid_core::{CoreError, PersistenceError};

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const REJECTED: i32 = 6;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Remote ───────────────────────────────────────────────────────

    #[error("Remote store unreachable: {message}")]
    #[diagnostic(
        code(sitegrid::remote_failed),
        help(
            "Check that the server is running and the URL is right.\n\
             Use --offline to work from the local cache."
        )
    )]
    Remote { message: String, status: Option<u16> },

    #[error("Remote store sent an unexpected response: {message}")]
    #[diagnostic(code(sitegrid::bad_response))]
    BadResponse { message: String },

    #[error("No remote URL configured")]
    #[diagnostic(
        code(sitegrid::no_remote),
        help(
            "Create a config with: sitegrid config init --url <URL>\n\
             Or pass --url / set SITEGRID_URL.\n\
             Expected config at: {path}"
        )
    )]
    NoRemote { path: String },

    #[error("'{operation}' needs the remote store")]
    #[diagnostic(code(sitegrid::offline), help("Drop --offline to run this command."))]
    Offline { operation: String },

    // ── Sites ────────────────────────────────────────────────────────

    #[error("Site {id} not found")]
    #[diagnostic(code(sitegrid::not_found), help("Run: sitegrid sites list"))]
    NotFound { id: String },

    #[error("Failed to save {name}: {reason}")]
    #[diagnostic(
        code(sitegrid::edit_rejected),
        help("The change was rolled back locally. Please try again.")
    )]
    EditRejected { name: String, reason: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(sitegrid::validation))]
    Validation { field: String, reason: String },

    // ── Local state ──────────────────────────────────────────────────

    #[error(transparent)]
    #[diagnostic(code(sitegrid::config))]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(
        code(sitegrid::persistence),
        help("Check permissions on the data directory, or set cache.dir in the config.")
    )]
    Persistence(#[from] PersistenceError),

    #[error("Internal error: {0}")]
    #[diagnostic(code(sitegrid::internal))]
    Internal(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Remote { .. } | Self::NoRemote { .. } => exit_code::CONNECTION,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::EditRejected { .. } => exit_code::REJECTED,
            Self::Validation { .. } | Self::Offline { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Transport { message, status } => CliError::Remote { message, status },
            CoreError::Format { message } => CliError::BadResponse { message },
            CoreError::Persistence(e) => CliError::Persistence(e),
            CoreError::SiteNotFound { id } => CliError::NotFound { id: id.to_string() },
            CoreError::Validation { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },
            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}
