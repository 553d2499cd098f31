// ── Filter state ──
//
// Owned by the UI, read by the projector on every pass. Never persisted.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::{Site, Status, normalize_zone};

/// Zone selector. Built from either an integer or a roman numeral; both
/// normalize to the same zone. An unrecognized token becomes zone 0,
/// which matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ZoneFilter {
    #[default]
    All,
    Zone(u32),
}

impl ZoneFilter {
    /// Parse a selector token: `all`/`full`/empty, an integer, or a numeral.
    pub fn parse(token: &str) -> Self {
        let trimmed = token.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") || trimmed.eq_ignore_ascii_case("full") {
            Self::All
        } else {
            Self::Zone(normalize_zone(trimmed))
        }
    }

    pub fn zone(self) -> Option<u32> {
        match self {
            Self::All => None,
            Self::Zone(z) => Some(z),
        }
    }

    fn matches(self, site: &Site) -> bool {
        match self {
            Self::All => true,
            Self::Zone(0) => false,
            Self::Zone(z) => site.zone == z,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StarFilter {
    #[default]
    All,
    Exact(u8),
}

impl StarFilter {
    fn matches(self, site: &Site) -> bool {
        match self {
            Self::All => true,
            Self::Exact(stars) => site.star_rating == Some(stars),
        }
    }
}

/// Status selector. `HighlightedOnly` is orthogonal to status: it keeps
/// highlighted sites whatever their status.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StatusFilter {
    #[default]
    All,
    Status(Status),
    HighlightedOnly,
}

impl StatusFilter {
    fn matches(&self, site: &Site, highlighted: bool) -> bool {
        match self {
            Self::All => true,
            Self::Status(status) => site.status == *status,
            Self::HighlightedOnly => highlighted,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PhaseFilter {
    #[default]
    All,
    /// Phase absent.
    None,
    Exact(u8),
}

impl PhaseFilter {
    fn matches(self, site: &Site) -> bool {
        match self {
            Self::All => true,
            Self::None => site.phase.is_none(),
            Self::Exact(p) => site.phase == Some(p),
        }
    }
}

/// The full set of view filters.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterState {
    pub zone: ZoneFilter,
    pub stars: StarFilter,
    pub status: StatusFilter,
    pub phase: PhaseFilter,
}

impl FilterState {
    /// Whether `site` survives every active filter.
    pub fn matches(&self, site: &Site, highlighted: bool) -> bool {
        self.zone.matches(site)
            && self.stars.matches(site)
            && self.status.matches(site, highlighted)
            && self.phase.matches(site)
    }
}

// ── Text forms ─────────────────────────────────────────────────────

/// Error for a filter token that does not parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} filter: {token:?}")]
pub struct FilterParseError {
    pub kind: &'static str,
    pub token: String,
}

impl FromStr for StarFilter {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        trimmed
            .parse::<u8>()
            .ok()
            .filter(|n| (1..=5).contains(n))
            .map(Self::Exact)
            .ok_or_else(|| FilterParseError {
                kind: "star",
                token: s.to_owned(),
            })
    }
}

impl FromStr for StatusFilter {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        if trimmed.eq_ignore_ascii_case("highlighted") {
            return Ok(Self::HighlightedOnly);
        }
        match trimmed.parse::<Status>() {
            Ok(status) if status.is_known() => Ok(Self::Status(status)),
            _ => Err(FilterParseError {
                kind: "status",
                token: s.to_owned(),
            }),
        }
    }
}

impl FromStr for PhaseFilter {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        if trimmed.eq_ignore_ascii_case("none") {
            return Ok(Self::None);
        }
        trimmed
            .parse::<u8>()
            .ok()
            .filter(|p| *p > 0)
            .map(Self::Exact)
            .ok_or_else(|| FilterParseError {
                kind: "phase",
                token: s.to_owned(),
            })
    }
}

impl fmt::Display for FilterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.zone {
            ZoneFilter::All => write!(f, "zone=all")?,
            ZoneFilter::Zone(z) => write!(f, "zone={z}")?,
        }
        match self.stars {
            StarFilter::All => write!(f, " stars=all")?,
            StarFilter::Exact(s) => write!(f, " stars={s}")?,
        }
        match &self.status {
            StatusFilter::All => write!(f, " status=all")?,
            StatusFilter::Status(s) => write!(f, " status={s}")?,
            StatusFilter::HighlightedOnly => write!(f, " status=highlighted")?,
        }
        match self.phase {
            PhaseFilter::All => write!(f, " phase=all"),
            PhaseFilter::None => write!(f, " phase=none"),
            PhaseFilter::Exact(p) => write!(f, " phase={p}"),
        }
    }
}
