// ── Site domain type ──

use serde::{Deserialize, Serialize};

use super::site_id::SiteId;
use super::status::Status;

/// A geographic coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Both components finite and inside the WGS84 range.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// A single geocoded record with editable operational status.
///
/// Coordinates, name, rating, zone and address are reference data loaded
/// from the remote table. Only `status`, `phase` and `notes` are edited
/// by the operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: SiteId,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Star rating, 1 to 5 when present.
    pub star_rating: Option<u8>,
    /// Normalized administrative zone; 0 when absent or unrecognized.
    pub zone: u32,
    pub status: Status,
    /// Sub-stage, meaningful only while `status.allows_phase()`.
    pub phase: Option<u8>,
    pub notes: Option<String>,
    pub address: Option<String>,
    pub capacity: Option<u32>,
}

impl Site {
    /// The marker position, if both coordinates are present and valid.
    pub fn position(&self) -> Option<LatLng> {
        let pos = LatLng::new(self.latitude?, self.longitude?);
        pos.is_valid().then_some(pos)
    }
}
