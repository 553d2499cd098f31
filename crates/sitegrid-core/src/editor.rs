// ── Edit panel view ──

use serde::Serialize;

use crate::command::EditDraft;
use crate::model::{Site, SiteId, zone_numeral};

/// What the edit panel shows for the selected site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditorView {
    pub id: SiteId,
    pub name: String,
    /// Zone as a roman numeral, or the raw number when out of range.
    pub zone: Option<String>,
    pub stars: Option<u8>,
    /// Display status token.
    pub status: String,
    pub address: Option<String>,
    /// Latitude to five decimals.
    pub latitude: Option<String>,
    /// Longitude to five decimals.
    pub longitude: Option<String>,
    pub phase: Option<u8>,
    pub notes: String,
    pub capacity: Option<u32>,
    pub highlighted: bool,
    /// Phase controls only apply to in-progress statuses.
    pub show_phase_controls: bool,
}

fn coordinate(value: Option<f64>) -> Option<String> {
    value.filter(|v| v.is_finite()).map(|v| format!("{v:.5}"))
}

impl EditorView {
    pub fn new(site: &Site, highlighted: bool) -> Self {
        let zone = match site.zone {
            0 => None,
            z => Some(zone_numeral(z).map_or_else(|| z.to_string(), str::to_owned)),
        };
        Self {
            id: site.id,
            name: site.name.clone(),
            zone,
            stars: site.star_rating,
            status: site.status.display_token().to_owned(),
            address: site.address.clone(),
            latitude: coordinate(site.latitude),
            longitude: coordinate(site.longitude),
            phase: site.phase,
            notes: site.notes.clone().unwrap_or_default(),
            capacity: site.capacity,
            highlighted,
            show_phase_controls: site.status.allows_phase(),
        }
    }

    /// A draft pre-filled with the current values.
    pub fn draft(&self) -> EditDraft {
        EditDraft {
            status: self.status.clone(),
            phase: self.phase,
            notes: self.notes.clone(),
        }
    }
}
