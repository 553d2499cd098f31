// ── Core error types ──
//
// User-facing errors from sitegrid-core. Consumers never see reqwest
// errors or raw JSON failures directly; `From<sitegrid_api::Error>`
// folds them into the transport / format split the sync engine recovers
// from.

use std::path::PathBuf;

use thiserror::Error;

use crate::model::SiteId;

/// Failure reading or writing a durable key.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid storage key '{0}'")]
    InvalidKey(String),
}

/// Why a single site was left out of a projection pass.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProjectionSkip {
    #[error("site {id} has no coordinates")]
    MissingCoordinates { id: SiteId },

    #[error("site {id} has invalid coordinates ({lat}, {lng})")]
    InvalidCoordinates { id: SiteId, lat: f64, lng: f64 },
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Remote store ─────────────────────────────────────────────────
    #[error("Remote store unreachable: {message}")]
    Transport { message: String, status: Option<u16> },

    #[error("Malformed response from remote store: {message}")]
    Format { message: String },

    // ── Local state ──────────────────────────────────────────────────
    #[error("Local storage unavailable: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Site not found: {id}")]
    SiteNotFound { id: SiteId },

    #[error("Validation failed: {message}")]
    Validation { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    pub fn is_format(&self) -> bool {
        matches!(self, Self::Format { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<sitegrid_api::Error> for CoreError {
    fn from(err: sitegrid_api::Error) -> Self {
        match err {
            sitegrid_api::Error::Format { message, body: _ } => CoreError::Format { message },
            other => {
                let status = other.status();
                CoreError::Transport {
                    message: other.to_string(),
                    status,
                }
            }
        }
    }
}
