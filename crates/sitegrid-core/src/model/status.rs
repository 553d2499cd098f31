// ── Operational status ──
//
// Storage tokens (what the remote table holds) and display tokens (what
// the operator sees) live in two namespaces. Both directions go through
// one table; values outside it pass through unchanged.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Operational status of a site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    #[default]
    Unset,
    Active,
    Pending,
    Blocked,
    /// A value outside the known taxonomy, kept verbatim.
    Other(String),
}

/// `(status, storage token, display token)`
static STATUS_TABLE: [(Status, &str, &str); 4] = [
    (Status::Active, "Green", "VERDE"),
    (Status::Pending, "Yellow", "GIALLO"),
    (Status::Blocked, "Red", "ROSSO"),
    (Status::Unset, "White", "BIANCO"),
];

impl Status {
    /// Every known status, in palette order.
    pub const KNOWN: [Status; 4] = [Status::Active, Status::Pending, Status::Blocked, Status::Unset];

    /// Decode a storage token. Empty input is `Unset`; unknown tokens are
    /// kept as `Other`.
    pub fn from_storage(token: &str) -> Self {
        if token.trim().is_empty() {
            return Self::Unset;
        }
        STATUS_TABLE
            .iter()
            .find(|(_, storage, _)| *storage == token)
            .map_or_else(|| Self::Other(token.to_owned()), |(s, _, _)| s.clone())
    }

    /// Decode a display token (edit direction). Case-insensitive; unknown
    /// tokens are kept verbatim.
    pub fn from_display(token: &str) -> Self {
        let trimmed = token.trim();
        STATUS_TABLE
            .iter()
            .find(|(_, _, display)| display.eq_ignore_ascii_case(trimmed))
            .map_or_else(|| Self::Other(trimmed.to_owned()), |(s, _, _)| s.clone())
    }

    /// The token written to the remote table and the cache.
    pub fn storage_token(&self) -> &str {
        match self {
            Self::Other(raw) => raw,
            known => Self::lookup(known).map_or("", |(_, storage, _)| storage),
        }
    }

    /// The token shown to the operator.
    pub fn display_token(&self) -> &str {
        match self {
            Self::Other(raw) => raw,
            known => Self::lookup(known).map_or("", |(_, _, display)| display),
        }
    }

    /// Whether a phase is meaningful for this status.
    pub fn allows_phase(&self) -> bool {
        matches!(self, Self::Active | Self::Pending)
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    fn lookup(status: &Status) -> Option<&'static (Status, &'static str, &'static str)> {
        STATUS_TABLE.iter().find(|(s, _, _)| s == status)
    }
}

impl From<String> for Status {
    fn from(raw: String) -> Self {
        Self::from_storage(&raw)
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        status.storage_token().to_owned()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_token())
    }
}

/// Accepts display or storage tokens, case-insensitively, so command-line
/// input like `verde`, `Green` or `GIALLO` all resolve.
impl FromStr for Status {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let found = STATUS_TABLE.iter().find(|(_, storage, display)| {
            storage.eq_ignore_ascii_case(trimmed) || display.eq_ignore_ascii_case(trimmed)
        });
        Ok(found.map_or_else(|| Self::Other(trimmed.to_owned()), |(s, _, _)| s.clone()))
    }
}
