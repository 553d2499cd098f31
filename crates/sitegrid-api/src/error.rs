use thiserror::Error;

/// Top-level error type for the `sitegrid-api` crate.
///
/// Covers every failure mode of the remote site table: transport,
/// non-success HTTP responses, and malformed payloads.
/// `sitegrid-core` maps these into its own taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The remote store answered with a non-success status.
    #[error("Remote store returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Client construction failed (bad header value, TLS backend, etc.)
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    // ── Data ────────────────────────────────────────────────────────
    /// The response body was not the shape we expected, with the raw
    /// body for debugging.
    #[error("Unexpected response format: {message}")]
    Format { message: String, body: String },
}

impl Error {
    /// Returns `true` for failures talking to the remote store
    /// (network, HTTP status, client setup).
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Http { .. } | Self::InvalidUrl(_) | Self::Client(_)
        )
    }

    /// Returns `true` if the remote store answered but the payload was malformed.
    pub fn is_format(&self) -> bool {
        matches!(self, Self::Format { .. })
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Http { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Returns `true` if the remote store reported the row as missing.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Http { status: 404, .. } => true,
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            _ => false,
        }
    }

    /// The HTTP status code, if the failure carried one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
