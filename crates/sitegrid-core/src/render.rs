// ── Render adapter surface ──
//
// The core never draws. It hands marker descriptors to a `RenderAdapter`
// and asks it for the current zoom and zone centroids. `MarkerBoard` is
// an in-memory adapter that keeps whatever is currently "on the map".

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwap;
use dashmap::DashMap;
use indexmap::IndexMap;
use serde::Serialize;

use crate::model::{LatLng, SiteId};

// ── Descriptors ────────────────────────────────────────────────────

/// Paint of one marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerStyle {
    pub fill_color: String,
    pub fill_opacity: f64,
    pub outline_color: String,
    pub outline_width: f64,
}

/// One logical marker. `hit_radius` is the invisible companion shape
/// used for hit testing; both primitives share one interaction handler.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerDescriptor {
    pub id: SiteId,
    pub position: LatLng,
    pub radius: f64,
    pub hit_radius: f64,
    pub style: MarkerStyle,
}

/// Side signal for a zone filter that matched nothing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmptyZoneNotice {
    pub zone: u32,
    /// Where to anchor the message; `None` if the boundary layer has no
    /// usable shape for the zone.
    pub centroid: Option<LatLng>,
}

impl fmt::Display for EmptyZoneNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match crate::model::zone_numeral(self.zone) {
            Some(numeral) => write!(f, "No sites found in zone {numeral}"),
            None => write!(f, "No sites found in zone {}", self.zone),
        }
    }
}

/// A user-visible message about something that did not go through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UserNotice {
    /// An edit was rolled back after the remote store refused it.
    EditFailed { id: SiteId, name: String, reason: String },
    /// No cache and the remote store could not be read.
    LoadFailed { reason: String },
}

impl fmt::Display for UserNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EditFailed { id, name, .. } if name.is_empty() => {
                write!(f, "Failed to save site {id}. Please try again.")
            }
            Self::EditFailed { name, .. } => write!(f, "Failed to save {name}. Please try again."),
            Self::LoadFailed { .. } => f.write_str("Could not load sites. Showing nothing until the next refresh."),
        }
    }
}

// ── Adapter trait ──────────────────────────────────────────────────

/// What the core needs from the map layer.
///
/// A projection pass removes every marker it added last time and adds
/// every new one; there is no attribute-level diffing.
pub trait RenderAdapter: Send + Sync {
    fn add_marker(&self, marker: &MarkerDescriptor);
    fn remove_marker(&self, id: SiteId);
    fn restyle_marker(&self, id: SiteId, style: &MarkerStyle);
    fn resize_marker(&self, id: SiteId, radius: f64, hit_radius: f64);
    fn current_zoom(&self) -> f64;
    fn zone_centroid(&self, zone: u32) -> Option<LatLng>;
    fn show_no_matches(&self, notice: &EmptyZoneNotice);
    fn notify(&self, notice: &UserNotice);
}

// ── MarkerBoard ────────────────────────────────────────────────────

/// In-memory render adapter: the set of markers currently shown plus any
/// notices raised, for headless front ends and tests.
pub struct MarkerBoard {
    markers: ArcSwap<IndexMap<SiteId, MarkerDescriptor>>,
    zoom_bits: AtomicU64,
    centroids: DashMap<u32, LatLng>,
    no_matches: ArcSwap<Option<EmptyZoneNotice>>,
    notices: ArcSwap<Vec<UserNotice>>,
    adds: AtomicU64,
    removes: AtomicU64,
}

impl MarkerBoard {
    pub fn new(zoom: f64) -> Self {
        Self {
            markers: ArcSwap::from_pointee(IndexMap::new()),
            zoom_bits: AtomicU64::new(zoom.to_bits()),
            centroids: DashMap::new(),
            no_matches: ArcSwap::from_pointee(None),
            notices: ArcSwap::from_pointee(Vec::new()),
            adds: AtomicU64::new(0),
            removes: AtomicU64::new(0),
        }
    }

    pub fn set_zoom(&self, zoom: f64) {
        self.zoom_bits.store(zoom.to_bits(), Ordering::Relaxed);
    }

    pub fn set_centroid(&self, zone: u32, centroid: LatLng) {
        self.centroids.insert(zone, centroid);
    }

    /// Markers currently shown, in the order they were added.
    pub fn markers(&self) -> Vec<MarkerDescriptor> {
        self.markers.load().values().cloned().collect()
    }

    pub fn marker(&self, id: SiteId) -> Option<MarkerDescriptor> {
        self.markers.load().get(&id).cloned()
    }

    pub fn marker_ids(&self) -> Vec<SiteId> {
        self.markers.load().keys().copied().collect()
    }

    /// The last empty-zone notice, cleared by the next `add_marker`.
    pub fn no_matches(&self) -> Option<EmptyZoneNotice> {
        Option::clone(&self.no_matches.load())
    }

    /// Drain the notices raised so far.
    pub fn take_notices(&self) -> Vec<UserNotice> {
        Vec::clone(&self.notices.swap(Arc::new(Vec::new())))
    }

    /// Total `(add_marker, remove_marker)` calls.
    pub fn op_counts(&self) -> (u64, u64) {
        (self.adds.load(Ordering::Relaxed), self.removes.load(Ordering::Relaxed))
    }

    fn update(&self, id: SiteId, f: impl Fn(&mut MarkerDescriptor)) {
        self.markers.rcu(|current| {
            let mut next = IndexMap::clone(current);
            if let Some(marker) = next.get_mut(&id) {
                f(marker);
            }
            next
        });
    }
}

impl Default for MarkerBoard {
    fn default() -> Self {
        Self::new(12.0)
    }
}

impl RenderAdapter for MarkerBoard {
    fn add_marker(&self, marker: &MarkerDescriptor) {
        self.markers.rcu(|current| {
            let mut next = IndexMap::clone(current);
            next.insert(marker.id, marker.clone());
            next
        });
        self.no_matches.store(Arc::new(None));
        self.adds.fetch_add(1, Ordering::Relaxed);
    }

    fn remove_marker(&self, id: SiteId) {
        self.markers.rcu(|current| {
            let mut next = IndexMap::clone(current);
            next.shift_remove(&id);
            next
        });
        self.removes.fetch_add(1, Ordering::Relaxed);
    }

    fn restyle_marker(&self, id: SiteId, style: &MarkerStyle) {
        self.update(id, |m| m.style = style.clone());
    }

    fn resize_marker(&self, id: SiteId, radius: f64, hit_radius: f64) {
        self.update(id, |m| {
            m.radius = radius;
            m.hit_radius = hit_radius;
        });
    }

    fn current_zoom(&self) -> f64 {
        f64::from_bits(self.zoom_bits.load(Ordering::Relaxed))
    }

    fn zone_centroid(&self, zone: u32) -> Option<LatLng> {
        self.centroids.get(&zone).map(|c| *c.value())
    }

    fn show_no_matches(&self, notice: &EmptyZoneNotice) {
        self.no_matches.store(Arc::new(Some(notice.clone())));
    }

    fn notify(&self, notice: &UserNotice) {
        self.notices.rcu(|current| {
            let mut next = Vec::clone(current);
            next.push(notice.clone());
            next
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn marker(id: i64) -> MarkerDescriptor {
        MarkerDescriptor {
            id: SiteId::new(id),
            position: LatLng::new(41.9, 12.5),
            radius: 3.0,
            hit_radius: 9.0,
            style: MarkerStyle {
                fill_color: "#22c55e".into(),
                fill_opacity: 0.9,
                outline_color: "#000000".into(),
                outline_width: 1.0,
            },
        }
    }

    #[test]
    fn board_tracks_add_remove_and_updates() {
        let board = MarkerBoard::new(11.0);
        board.add_marker(&marker(1));
        board.add_marker(&marker(2));
        board.resize_marker(SiteId::new(2), 5.0, 11.0);
        board.remove_marker(SiteId::new(1));

        assert_eq!(board.marker_ids(), vec![SiteId::new(2)]);
        assert!((board.marker(SiteId::new(2)).unwrap().radius - 5.0).abs() < f64::EPSILON);
        assert_eq!(board.op_counts(), (2, 1));
        assert!((board.current_zoom() - 11.0).abs() < f64::EPSILON);
    }

    #[test]
    fn notices_drain() {
        let board = MarkerBoard::default();
        board.notify(&UserNotice::LoadFailed { reason: "offline".into() });
        assert_eq!(board.take_notices().len(), 1);
        assert!(board.take_notices().is_empty());
    }

    #[test]
    fn edit_failure_message() {
        let notice = UserNotice::EditFailed {
            id: SiteId::new(3),
            name: "Hotel Roma".into(),
            reason: "HTTP 500".into(),
        };
        assert_eq!(notice.to_string(), "Failed to save Hotel Roma. Please try again.");
    }

    #[test]
    fn empty_zone_message_uses_numeral() {
        let notice = EmptyZoneNotice { zone: 4, centroid: None };
        assert_eq!(notice.to_string(), "No sites found in zone IV");
    }
}
