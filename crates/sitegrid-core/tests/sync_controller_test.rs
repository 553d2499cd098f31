#![allow(clippy::unwrap_used)]
// Integration tests for `SyncController` against an in-process gateway.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use serde_json::{Value, json};
use tokio::sync::Notify;

use sitegrid_api::{RawSiteRecord, SiteUpdateBody};
use sitegrid_core::projector::{ACTIVE_COLOR, BLOCKED_COLOR};
use sitegrid_core::{
    CoreError, EditDraft, EditOutcome, FilterState, KeyValueStore, LoadState, MarkerBoard,
    MemoryStore, RemoteGateway, Site, SiteCache, SiteId, StarFilter, Status, StatusFilter,
    SyncConfig, SyncController, UserNotice, ZoneFilter,
};

// ── Fake gateway ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchMode {
    Rows,
    Hang,
    Fail,
    Malformed,
}

#[derive(Default)]
struct GatewayState {
    rows: Mutex<Vec<RawSiteRecord>>,
    fetch_mode: Mutex<Option<FetchMode>>,
    fail_updates: AtomicBool,
    gated: AtomicBool,
    gate: Notify,
    fetch_calls: AtomicUsize,
    updates: Mutex<Vec<(SiteId, SiteUpdateBody)>>,
}

#[derive(Clone, Default)]
struct FakeGateway {
    state: Arc<GatewayState>,
}

impl FakeGateway {
    fn with_rows(rows: Vec<RawSiteRecord>) -> Self {
        let gw = Self::default();
        *gw.state.rows.lock().unwrap() = rows;
        gw.set_fetch(FetchMode::Rows);
        gw
    }

    fn set_fetch(&self, mode: FetchMode) {
        *self.state.fetch_mode.lock().unwrap() = Some(mode);
    }

    fn fail_updates(&self) {
        self.state.fail_updates.store(true, Ordering::SeqCst);
    }

    fn hold_updates(&self) {
        self.state.gated.store(true, Ordering::SeqCst);
    }

    fn release_update(&self) {
        self.state.gate.notify_one();
    }

    fn updates(&self) -> Vec<(SiteId, SiteUpdateBody)> {
        self.state.updates.lock().unwrap().clone()
    }

    fn fetch_calls(&self) -> usize {
        self.state.fetch_calls.load(Ordering::SeqCst)
    }
}

impl RemoteGateway for FakeGateway {
    fn fetch_all(&self) -> impl Future<Output = Result<Vec<RawSiteRecord>, CoreError>> + Send {
        let state = Arc::clone(&self.state);
        async move {
            state.fetch_calls.fetch_add(1, Ordering::SeqCst);
            let mode = state.fetch_mode.lock().unwrap().unwrap_or(FetchMode::Rows);
            if mode == FetchMode::Hang {
                return std::future::pending().await;
            }
            let rows = state.rows.lock().unwrap().clone();
            match mode {
                FetchMode::Rows | FetchMode::Hang => Ok(rows),
                FetchMode::Fail => Err(CoreError::Transport {
                    message: "connection refused".into(),
                    status: None,
                }),
                FetchMode::Malformed => Err(CoreError::Format {
                    message: "expected a JSON list of rows".into(),
                }),
            }
        }
    }

    fn update_one(
        &self,
        id: SiteId,
        body: &SiteUpdateBody,
    ) -> impl Future<Output = Result<RawSiteRecord, CoreError>> + Send {
        let state = Arc::clone(&self.state);
        let body = body.clone();
        async move {
            if state.gated.load(Ordering::SeqCst) {
                state.gate.notified().await;
            }
            state.updates.lock().unwrap().push((id, body.clone()));
            if state.fail_updates.load(Ordering::SeqCst) {
                return Err(CoreError::Transport {
                    message: "HTTP 500".into(),
                    status: Some(500),
                });
            }
            Ok(row(json!({ "id": id.get(), "status": body.status, "phase": body.phase, "notes": body.notes })))
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn row(value: Value) -> RawSiteRecord {
    match value {
        Value::Object(map) => map,
        _ => panic!("rows must be objects"),
    }
}

fn raw_site(id: i64, zone: u32, stars: u8, status: &str) -> RawSiteRecord {
    row(json!({
        "id": id,
        "hotel_name": format!("Hotel {id}"),
        "latitude": 41.80 + f64::from(u32::try_from(id).unwrap()) / 1000.0,
        "longitude": 12.45,
        "star_rating": stars,
        "municipio": zone,
        "status": status,
    }))
}

fn cached_site(id: i64) -> Arc<Site> {
    Arc::new(Site {
        id: SiteId::new(id),
        name: format!("Cached {id}"),
        latitude: Some(41.9),
        longitude: Some(12.5),
        star_rating: Some(3),
        zone: 1,
        status: Status::Pending,
        phase: Some(1),
        notes: None,
        address: None,
        capacity: None,
    })
}

struct Harness {
    ctrl: SyncController<FakeGateway>,
    gateway: FakeGateway,
    board: Arc<MarkerBoard>,
    backend: Arc<MemoryStore>,
}

fn harness_with(gateway: FakeGateway, backend: Arc<MemoryStore>) -> Harness {
    let board = Arc::new(MarkerBoard::new(12.0));
    let ctrl = SyncController::new(gateway.clone(), backend.clone(), board.clone(), SyncConfig::default());
    Harness {
        ctrl,
        gateway,
        board,
        backend,
    }
}

fn harness(gateway: FakeGateway) -> Harness {
    harness_with(gateway, Arc::new(MemoryStore::new()))
}

fn seed_cache(backend: &Arc<MemoryStore>, ids: &[i64], age: chrono::Duration) {
    let cache = SiteCache::new(backend.clone(), Duration::from_secs(300));
    let sites: Vec<_> = ids.iter().map(|id| cached_site(*id)).collect();
    cache.store_at(&sites, Utc::now() - age).unwrap();
}

async fn loaded(rows: Vec<RawSiteRecord>) -> Harness {
    let h = harness(FakeGateway::with_rows(rows));
    h.ctrl.start().await.unwrap().unwrap();
    h.ctrl.project_now();
    h
}

// ── Load protocol ───────────────────────────────────────────────────

#[tokio::test]
async fn fresh_cache_is_served_without_the_gateway() {
    let backend = Arc::new(MemoryStore::new());
    seed_cache(&backend, &[1, 2, 3], chrono::Duration::seconds(30));
    let gateway = FakeGateway::default();
    gateway.set_fetch(FetchMode::Hang);
    let h = harness_with(gateway, backend);

    let handle = h.ctrl.start();

    assert_eq!(h.ctrl.store().len(), 3);
    assert_eq!(h.ctrl.load_state(), LoadState::ServingCache);
    let names: Vec<String> = h.ctrl.store().snapshot().iter().map(|s| s.name.clone()).collect();
    assert_eq!(names, vec!["Cached 1", "Cached 2", "Cached 3"]);

    h.ctrl.shutdown();
    assert!(handle.await.unwrap().is_err());
}

#[tokio::test]
async fn stale_cache_is_replaced_by_the_fetch() {
    let backend = Arc::new(MemoryStore::new());
    seed_cache(&backend, &[1, 2, 3], chrono::Duration::minutes(10));
    let rows = (10..15).map(|id| raw_site(id, 2, 4, "Green")).collect();
    let h = harness_with(FakeGateway::with_rows(rows), backend);

    let handle = h.ctrl.start();
    assert_eq!(h.ctrl.store().len(), 3, "stale snapshot served provisionally");

    assert_eq!(handle.await.unwrap().unwrap(), 5);
    assert_eq!(h.ctrl.store().len(), 5);
    assert!(h.ctrl.store().get(SiteId::new(1)).is_none());
    assert_eq!(h.ctrl.load_state(), LoadState::Ready);

    let snapshot = h.ctrl.cache().read().unwrap().unwrap();
    assert!(snapshot.fresh);
    assert_eq!(snapshot.sites.len(), 5);
    assert_eq!(h.gateway.fetch_calls(), 1);
}

#[tokio::test]
async fn failed_fetch_without_cache_renders_nothing() {
    let gateway = FakeGateway::default();
    gateway.set_fetch(FetchMode::Fail);
    let h = harness(gateway);

    let handle = h.ctrl.start();
    assert_eq!(h.ctrl.load_state(), LoadState::Fetching);
    let err = handle.await.unwrap().unwrap_err();
    assert!(err.is_transport());

    assert!(h.ctrl.store().is_empty());
    assert!(h.ctrl.project_now().markers.is_empty());
    assert!(matches!(h.board.take_notices().as_slice(), [UserNotice::LoadFailed { .. }]));
    assert_eq!(h.ctrl.take_warnings().len(), 1);
}

#[tokio::test]
async fn failed_fetch_keeps_serving_cache() {
    let backend = Arc::new(MemoryStore::new());
    seed_cache(&backend, &[1, 2], chrono::Duration::minutes(30));
    let gateway = FakeGateway::default();
    gateway.set_fetch(FetchMode::Fail);
    let h = harness_with(gateway, backend);

    let result = h.ctrl.start().await.unwrap();
    assert!(result.is_err());
    assert_eq!(h.ctrl.store().len(), 2);
    assert!(h.board.take_notices().is_empty());

    let warnings = h.ctrl.take_warnings();
    assert!(warnings.iter().any(|w| w.contains("remote load failed")), "{warnings:?}");
    assert!(h.ctrl.take_warnings().is_empty());
}

#[tokio::test]
async fn malformed_response_is_an_empty_result() {
    let gateway = FakeGateway::default();
    gateway.set_fetch(FetchMode::Malformed);
    let h = harness(gateway);

    let err = h.ctrl.start().await.unwrap().unwrap_err();
    assert!(err.is_format());
    assert!(h.ctrl.store().is_empty());
}

#[tokio::test]
async fn sequential_loads_converge() {
    let rows = vec![
        row(json!({ "id": 1, "Hotel_Name": "A", "Latitude": "41.9", "Longitude": "12.5", "Municipio": "II" })),
        row(json!({ "id": 2, "hotel_name": "B", "latitude": 41.8, "longitude": 12.4, "municipio": 2 })),
    ];
    let h = harness(FakeGateway::with_rows(rows));

    let (a, b) = tokio::join!(h.ctrl.revalidate(), h.ctrl.revalidate());
    assert_eq!(a.unwrap(), 2);
    assert_eq!(b.unwrap(), 2);
    let first = h.ctrl.store().snapshot();
    h.ctrl.revalidate().await.unwrap();
    assert_eq!(*first, *h.ctrl.store().snapshot());
    assert!(first.iter().all(|s| s.zone == 2));
}

#[tokio::test]
async fn repeat_revalidate_keeps_serving_loaded_sites() {
    let h = loaded(vec![raw_site(1, 1, 3, "Green")]).await;
    assert_eq!(h.ctrl.load_state(), LoadState::Ready);

    h.gateway.set_fetch(FetchMode::Hang);
    let ctrl = h.ctrl.clone();
    let pending = tokio::spawn(async move { ctrl.revalidate().await });
    while h.gateway.fetch_calls() < 2 {
        tokio::task::yield_now().await;
    }

    assert_eq!(h.ctrl.load_state(), LoadState::ServingCache);
    assert_eq!(h.ctrl.store().len(), 1);
    pending.abort();
}

// ── Optimistic edits ────────────────────────────────────────────────

#[tokio::test]
async fn edit_is_visible_before_the_commit_resolves() {
    let h = loaded(vec![raw_site(1, 1, 3, "Green"), raw_site(2, 1, 3, "Green")]).await;
    h.gateway.hold_updates();

    let view = h.ctrl.open_editor(SiteId::new(1)).unwrap();
    assert_eq!(view.status, "VERDE");
    let mut draft = view.draft();
    draft.set_status("ROSSO");
    draft.notes = "closed for renovation".into();

    let pending = h.ctrl.submit_edit(&draft).unwrap().unwrap();

    let site = h.ctrl.store().get(SiteId::new(1)).unwrap();
    assert_eq!(site.status, Status::Blocked);
    assert_eq!(site.notes.as_deref(), Some("closed for renovation"));
    let cached = h.ctrl.cache().read().unwrap().unwrap();
    let cached_one = cached.sites.iter().find(|s| s.id == SiteId::new(1)).unwrap();
    assert_eq!(cached_one.status, Status::Blocked);
    assert_eq!(h.board.marker(SiteId::new(1)).unwrap().style.fill_color, BLOCKED_COLOR);
    assert_eq!(h.board.marker(SiteId::new(2)).unwrap().style.fill_color, ACTIVE_COLOR);
    assert!(h.gateway.updates().is_empty());

    h.gateway.release_update();
    assert_eq!(pending.outcome().await.unwrap(), EditOutcome::Committed);

    let updates = h.gateway.updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].1.status, "Red");
    assert_eq!(updates[0].1.phase, None);
    assert_eq!(h.ctrl.selected(), None, "editor closes after a confirmed save");
    assert_eq!(h.ctrl.project_now().markers.len(), 2);
}

#[tokio::test]
async fn rejected_edit_rolls_back() {
    let h = loaded(vec![raw_site(1, 1, 3, "Green"), raw_site(2, 1, 3, "Yellow")]).await;
    h.gateway.fail_updates();
    let before = h.ctrl.store().get(SiteId::new(1)).unwrap();

    h.ctrl.open_editor(SiteId::new(1)).unwrap();
    let draft = EditDraft {
        status: "BIANCO".into(),
        phase: None,
        notes: "gone".into(),
    };
    let pending = h.ctrl.submit_edit(&draft).unwrap().unwrap();
    assert_eq!(h.ctrl.store().get(SiteId::new(1)).unwrap().status, Status::Unset);

    let outcome = pending.outcome().await.unwrap();
    assert!(matches!(outcome, EditOutcome::RolledBack { .. }));

    let after = h.ctrl.store().get(SiteId::new(1)).unwrap();
    assert_eq!(*after, *before);
    assert_eq!(h.board.marker(SiteId::new(1)).unwrap().style.fill_color, ACTIVE_COLOR);
    assert_eq!(h.ctrl.store().get(SiteId::new(2)).unwrap().status, Status::Pending);
    assert_eq!(h.ctrl.selected(), Some(SiteId::new(1)), "editor stays open after a failed save");

    let notices = h.board.take_notices();
    assert!(matches!(notices.as_slice(), [UserNotice::EditFailed { id, .. }] if *id == SiteId::new(1)));
    assert_eq!(notices[0].to_string(), "Failed to save Hotel 1. Please try again.");
    assert_eq!(h.ctrl.take_warnings().len(), 1);
}

#[tokio::test]
async fn submit_without_selection_is_a_noop() {
    let h = loaded(vec![raw_site(1, 1, 3, "Green")]).await;
    let draft = EditDraft {
        status: "ROSSO".into(),
        phase: None,
        notes: String::new(),
    };
    assert!(h.ctrl.submit_edit(&draft).unwrap().is_none());
    assert_eq!(h.ctrl.store().get(SiteId::new(1)).unwrap().status, Status::Active);
    assert!(h.gateway.updates().is_empty());
}

#[tokio::test]
async fn open_editor_unknown_site() {
    let h = loaded(vec![raw_site(1, 1, 3, "Green")]).await;
    let err = h.ctrl.open_editor(SiteId::new(99)).unwrap_err();
    assert!(matches!(err, CoreError::SiteNotFound { .. }));
    assert_eq!(h.ctrl.selected(), None);
}

// ── Projection ──────────────────────────────────────────────────────

#[tokio::test]
async fn zone_and_star_filters_select_matching_sites() {
    let h = loaded(vec![raw_site(1, 3, 4, "Green"), raw_site(2, 3, 2, "Red")]).await;
    h.ctrl.set_filter(FilterState {
        zone: ZoneFilter::Zone(3),
        stars: StarFilter::Exact(4),
        ..FilterState::default()
    });
    let projection = h.ctrl.project_now();
    assert_eq!(projection.ids(), vec![SiteId::new(1)]);
    assert_eq!(h.board.marker_ids(), vec![SiteId::new(1)]);
}

#[tokio::test]
async fn same_filter_twice_gives_identical_markers() {
    let rows = (1..=12).map(|id| raw_site(id, u32::try_from(id % 3).unwrap() + 1, 3, "Yellow")).collect();
    let h = loaded(rows).await;
    h.ctrl.set_filter(FilterState {
        zone: ZoneFilter::parse("II"),
        ..FilterState::default()
    });
    let first = h.ctrl.project_now();
    let second = h.ctrl.project_now();
    assert_eq!(first.markers, second.markers);
    assert_eq!(first.markers.len(), 4);
}

#[tokio::test(start_paused = true)]
async fn filter_changes_coalesce_into_one_pass() {
    let rows = (1..=6).map(|id| raw_site(id, u32::try_from(id).unwrap(), 3, "Green")).collect();
    let h = harness(FakeGateway::with_rows(rows));
    h.ctrl.start().await.unwrap().unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    let baseline = h.ctrl.projector().pass_count();
    assert_eq!(baseline, 1, "load completion triggers one debounced pass");

    for zone in 1..=5 {
        h.ctrl.set_filter(FilterState {
            zone: ZoneFilter::Zone(zone),
            ..FilterState::default()
        });
        tokio::time::sleep(Duration::from_millis(30)).await;
    }
    assert_eq!(h.ctrl.projector().pass_count(), baseline);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(h.ctrl.projector().pass_count(), baseline + 1);
    assert_eq!(h.ctrl.latest_projection().ids(), vec![SiteId::new(5)]);
}

#[tokio::test(start_paused = true)]
async fn zoom_end_resizes_without_a_pass() {
    let h = loaded(vec![raw_site(1, 1, 3, "Green"), raw_site(2, 1, 3, "Red")]).await;
    let passes = h.ctrl.projector().pass_count();
    let max = h.ctrl.config().marker.max_radius;

    h.board.set_zoom(18.0);
    h.ctrl.on_zoom_end();
    h.board.set_zoom(30.0);
    h.ctrl.on_zoom_end();
    tokio::time::sleep(Duration::from_millis(200)).await;

    for marker in h.board.markers() {
        assert!((marker.radius - max).abs() < 1e-9);
    }
    assert_eq!(h.ctrl.projector().pass_count(), passes);
}

#[tokio::test]
async fn empty_zone_reports_no_matches() {
    let h = loaded(vec![raw_site(1, 1, 3, "Green")]).await;
    h.board.set_centroid(7, sitegrid_core::LatLng::new(41.85, 12.6));
    h.ctrl.set_filter(FilterState {
        zone: ZoneFilter::parse("VII"),
        ..FilterState::default()
    });
    let projection = h.ctrl.project_now();
    assert_eq!(projection.empty_zone, Some(7));
    assert!(h.board.markers().is_empty());
    assert!(h.board.no_matches().unwrap().centroid.is_some());
}

// ── Highlights ──────────────────────────────────────────────────────

#[tokio::test]
async fn toggled_highlight_shows_under_highlighted_only() {
    let rows = (1..=10).map(|id| raw_site(id, 1, 3, "Green")).collect();
    let h = loaded(rows).await;

    assert!(h.ctrl.toggle_highlight(SiteId::new(7)));
    h.ctrl.set_filter(FilterState {
        status: StatusFilter::HighlightedOnly,
        ..FilterState::default()
    });
    assert_eq!(h.ctrl.project_now().ids(), vec![SiteId::new(7)]);

    assert!(!h.ctrl.toggle_highlight(SiteId::new(7)));
    assert!(h.ctrl.project_now().ids().is_empty());
}

#[tokio::test]
async fn highlight_restyles_and_survives_reload() {
    let rows = vec![raw_site(1, 1, 3, "Green"), raw_site(2, 1, 3, "Green")];
    let h = loaded(rows.clone()).await;
    h.ctrl.toggle_highlight(SiteId::new(2));
    let accent = h.ctrl.config().marker.highlight_color.clone();
    assert_eq!(h.board.marker(SiteId::new(2)).unwrap().style.outline_color, accent);

    let again = harness_with(FakeGateway::with_rows(rows), h.backend.clone());
    assert!(again.ctrl.is_highlighted(SiteId::new(2)));
    assert!(h.backend.get(sitegrid_core::HIGHLIGHT_KEY).unwrap().is_some());
}
