// ── Runtime sync configuration ──
//
// Tuning for the sync engine and projector. Plain data: core never reads
// config files. The CLI builds a `SyncConfig` from `sitegrid-config` and
// hands it in.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Marker sizing and styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerStyleConfig {
    /// Radius at or below `min_zoom`.
    pub min_radius: f64,
    /// Radius at `min_zoom + zoom_range` and beyond.
    pub max_radius: f64,
    pub min_zoom: f64,
    pub zoom_range: f64,
    /// Extra radius of the invisible hit-test companion.
    pub hit_slop: f64,
    pub outline_color: String,
    pub outline_width: f64,
    /// Outline of highlighted sites.
    pub highlight_color: String,
    pub highlight_width: f64,
    pub fill_opacity: f64,
}

impl Default for MarkerStyleConfig {
    fn default() -> Self {
        Self {
            min_radius: 3.0,
            max_radius: 8.0,
            min_zoom: 10.0,
            zoom_range: 15.0,
            hit_slop: 6.0,
            outline_color: "#000000".into(),
            outline_width: 1.0,
            highlight_color: "#ffd700".into(),
            highlight_width: 2.0,
            fill_opacity: 0.9,
        }
    }
}

/// Sync engine configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    /// Age after which a cache snapshot is stale.
    pub staleness: Duration,
    /// Coalescing window for filter changes and load completion.
    pub filter_debounce: Duration,
    /// Coalescing window for zoom-end resizing.
    pub zoom_debounce: Duration,
    pub marker: MarkerStyleConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            staleness: Duration::from_secs(5 * 60),
            filter_debounce: Duration::from_millis(150),
            zoom_debounce: Duration::from_millis(150),
            marker: MarkerStyleConfig::default(),
        }
    }
}
