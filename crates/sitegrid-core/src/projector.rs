// ── View projection ──
//
// `project` is a pure function of (sites, highlights, filters, zoom) to
// an ordered list of marker descriptors. `ViewProjector` pushes each
// result to the render adapter as remove-all / add-all, and handles the
// two in-place updates that do not need a full pass: zoom resizing and
// recoloring a single edited site.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwap;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::config::MarkerStyleConfig;
use crate::error::ProjectionSkip;
use crate::filter::{FilterState, ZoneFilter};
use crate::model::{Site, SiteId, Status};
use crate::render::{EmptyZoneNotice, MarkerDescriptor, MarkerStyle, RenderAdapter};

// ── Palette ────────────────────────────────────────────────────────

pub const ACTIVE_COLOR: &str = "#22c55e";
pub const PENDING_COLOR: &str = "#facc15";
pub const BLOCKED_COLOR: &str = "#ef4444";
pub const UNSET_COLOR: &str = "#ffffff";
pub const UNKNOWN_COLOR: &str = "#9e9e9e";

/// Fill color for a status.
pub fn status_color(status: &Status) -> &'static str {
    match status {
        Status::Active => ACTIVE_COLOR,
        Status::Pending => PENDING_COLOR,
        Status::Blocked => BLOCKED_COLOR,
        Status::Unset => UNSET_COLOR,
        Status::Other(_) => UNKNOWN_COLOR,
    }
}

/// Marker radius for a zoom level.
///
/// Fixed `min_radius` at or below `min_zoom`, then square-root growth to
/// `max_radius` across `zoom_range`. A non-finite zoom is treated as the
/// minimum.
pub fn marker_radius(zoom: f64, cfg: &MarkerStyleConfig) -> f64 {
    let t = if zoom.is_finite() && cfg.zoom_range > 0.0 {
        ((zoom - cfg.min_zoom) / cfg.zoom_range).clamp(0.0, 1.0)
    } else {
        0.0
    };
    cfg.min_radius + t.sqrt() * (cfg.max_radius - cfg.min_radius)
}

/// Paint for a site. Outline reflects highlight membership only.
pub fn marker_style(site: &Site, highlighted: bool, cfg: &MarkerStyleConfig) -> MarkerStyle {
    let (outline_color, outline_width) = if highlighted {
        (cfg.highlight_color.clone(), cfg.highlight_width)
    } else {
        (cfg.outline_color.clone(), cfg.outline_width)
    };
    MarkerStyle {
        fill_color: status_color(&site.status).to_owned(),
        fill_opacity: cfg.fill_opacity,
        outline_color,
        outline_width,
    }
}

fn describe(
    site: &Site,
    highlighted: bool,
    radius: f64,
    cfg: &MarkerStyleConfig,
) -> Result<MarkerDescriptor, ProjectionSkip> {
    let (Some(lat), Some(lng)) = (site.latitude, site.longitude) else {
        return Err(ProjectionSkip::MissingCoordinates { id: site.id });
    };
    let position = site
        .position()
        .ok_or(ProjectionSkip::InvalidCoordinates { id: site.id, lat, lng })?;
    Ok(MarkerDescriptor {
        id: site.id,
        position,
        radius,
        hit_radius: radius + cfg.hit_slop,
        style: marker_style(site, highlighted, cfg),
    })
}

// ── Projection ─────────────────────────────────────────────────────

/// Result of one projection pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    pub markers: Vec<MarkerDescriptor>,
    /// Set when a specific zone filter matched no site.
    pub empty_zone: Option<u32>,
    /// Sites that passed the filters but could not be drawn.
    pub skipped: usize,
    /// Sites considered.
    pub total: usize,
    pub zoom: f64,
}

impl Projection {
    pub fn ids(&self) -> Vec<SiteId> {
        self.markers.iter().map(|m| m.id).collect()
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            markers: Vec::new(),
            empty_zone: None,
            skipped: 0,
            total: 0,
            zoom: 0.0,
        }
    }
}

/// Project sites to marker descriptors, in store order.
pub fn project(
    sites: &[Arc<Site>],
    highlights: &BTreeSet<SiteId>,
    filter: &FilterState,
    zoom: f64,
    cfg: &MarkerStyleConfig,
) -> Projection {
    let radius = marker_radius(zoom, cfg);
    let mut markers = Vec::new();
    let mut matched = 0usize;
    let mut skipped = 0usize;

    for site in sites {
        let highlighted = highlights.contains(&site.id);
        if !filter.matches(site, highlighted) {
            continue;
        }
        matched += 1;
        match describe(site, highlighted, radius, cfg) {
            Ok(marker) => markers.push(marker),
            Err(skip) => {
                skipped += 1;
                warn!(site_id = %site.id, reason = %skip, "site left out of projection");
            }
        }
    }

    let empty_zone = match filter.zone {
        ZoneFilter::Zone(zone) if matched == 0 => Some(zone),
        _ => None,
    };

    Projection {
        markers,
        empty_zone,
        skipped,
        total: sites.len(),
        zoom,
    }
}

// ── ViewProjector ──────────────────────────────────────────────────

/// Drives a render adapter from projection results.
pub struct ViewProjector {
    adapter: Arc<dyn RenderAdapter>,
    style: MarkerStyleConfig,
    displayed: ArcSwap<Vec<SiteId>>,
    passes: AtomicU64,
    last: watch::Sender<Arc<Projection>>,
}

impl ViewProjector {
    pub fn new(adapter: Arc<dyn RenderAdapter>, style: MarkerStyleConfig) -> Self {
        let (last, _) = watch::channel(Arc::new(Projection::default()));
        Self {
            adapter,
            style,
            displayed: ArcSwap::from_pointee(Vec::new()),
            passes: AtomicU64::new(0),
            last,
        }
    }

    pub fn adapter(&self) -> &Arc<dyn RenderAdapter> {
        &self.adapter
    }

    pub fn style(&self) -> &MarkerStyleConfig {
        &self.style
    }

    /// Run a full pass at the adapter's current zoom and push it out.
    pub fn render(
        &self,
        sites: &[Arc<Site>],
        highlights: &BTreeSet<SiteId>,
        filter: &FilterState,
    ) -> Arc<Projection> {
        let zoom = self.adapter.current_zoom();
        let projection = project(sites, highlights, filter, zoom, &self.style);

        for id in self.displayed.load().iter() {
            self.adapter.remove_marker(*id);
        }
        for marker in &projection.markers {
            self.adapter.add_marker(marker);
        }
        self.displayed.store(Arc::new(projection.ids()));

        if let Some(zone) = projection.empty_zone {
            let notice = EmptyZoneNotice {
                zone,
                centroid: self.adapter.zone_centroid(zone),
            };
            self.adapter.show_no_matches(&notice);
            warn!(%filter, total = projection.total, "no sites after filtering");
        }

        let pass = self.passes.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(
            pass,
            %filter,
            zoom,
            total = projection.total,
            shown = projection.markers.len(),
            skipped = projection.skipped,
            "projection complete"
        );

        let projection = Arc::new(projection);
        self.last.send_replace(projection.clone());
        projection
    }

    /// Re-radius the markers on screen for a new zoom, without a pass.
    pub fn resize(&self, zoom: f64) {
        let radius = marker_radius(zoom, &self.style);
        let hit_radius = radius + self.style.hit_slop;
        let displayed = self.displayed.load();
        for id in displayed.iter() {
            self.adapter.resize_marker(*id, radius, hit_radius);
        }
        self.last.send_modify(|last| {
            let p = Arc::make_mut(last);
            p.zoom = zoom;
            for m in &mut p.markers {
                m.radius = radius;
                m.hit_radius = hit_radius;
            }
        });
        debug!(zoom, radius, count = displayed.len(), "resized markers");
    }

    /// Recolor one site's marker if it is on screen.
    pub fn restyle(&self, site: &Site, highlighted: bool) -> bool {
        if !self.displayed.load().contains(&site.id) {
            return false;
        }
        let style = marker_style(site, highlighted, &self.style);
        self.adapter.restyle_marker(site.id, &style);
        self.last.send_modify(|last| {
            let p = Arc::make_mut(last);
            if let Some(m) = p.markers.iter_mut().find(|m| m.id == site.id) {
                m.style = style.clone();
            }
        });
        true
    }

    /// Number of full passes run so far.
    pub fn pass_count(&self) -> u64 {
        self.passes.load(Ordering::Relaxed)
    }

    /// Ids currently on screen.
    pub fn displayed(&self) -> Vec<SiteId> {
        Vec::clone(&self.displayed.load())
    }

    pub fn latest(&self) -> Arc<Projection> {
        self.last.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Projection>> {
        self.last.subscribe()
    }
}
