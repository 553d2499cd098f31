// ── Sync controller ──
//
// Owns the site store and cache, drives the projector, and talks to the
// remote store through a `RemoteGateway`. Loads are cache-first with a
// background revalidation; edits are applied optimistically and rolled
// back through the same store setter when the remote commit fails.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use sitegrid_api::{RawSiteRecord, SiteTableClient, SiteUpdateBody};

use crate::cache::SiteCache;
use crate::command::{EditCommand, EditDraft, SiteEdit};
use crate::config::SyncConfig;
use crate::convert::normalize_records;
use crate::debounce::{DebounceKey, Debouncer};
use crate::editor::EditorView;
use crate::error::CoreError;
use crate::filter::{FilterState, StatusFilter};
use crate::highlight::HighlightSet;
use crate::model::{Site, SiteId};
use crate::persist::KeyValueStore;
use crate::projector::{Projection, ViewProjector};
use crate::render::{RenderAdapter, UserNotice};
use crate::store::SiteStore;

// ── RemoteGateway ────────────────────────────────────────────────

/// Fetch-all and update-one against the authoritative store.
pub trait RemoteGateway: Send + Sync + 'static {
    /// Every row. Fails with a transport error on network / HTTP failure
    /// and a format error when the response is not a list.
    fn fetch_all(&self) -> impl Future<Output = Result<Vec<RawSiteRecord>, CoreError>> + Send;

    /// Partial update of status, phase and notes.
    fn update_one(
        &self,
        id: SiteId,
        body: &SiteUpdateBody,
    ) -> impl Future<Output = Result<RawSiteRecord, CoreError>> + Send;
}

impl RemoteGateway for SiteTableClient {
    fn fetch_all(&self) -> impl Future<Output = Result<Vec<RawSiteRecord>, CoreError>> + Send {
        async move { Ok(SiteTableClient::fetch_all(self).await?) }
    }

    fn update_one(
        &self,
        id: SiteId,
        body: &SiteUpdateBody,
    ) -> impl Future<Output = Result<RawSiteRecord, CoreError>> + Send {
        async move { Ok(SiteTableClient::update_one(self, id.get(), body).await?) }
    }
}

// ── LoadState ────────────────────────────────────────────────────

/// Load protocol state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum LoadState {
    Idle,
    CacheCheck,
    /// Sites from the cache or an earlier load are on screen; revalidation
    /// is in flight.
    ServingCache,
    /// Nothing to show yet; waiting for the remote store.
    Fetching,
    Ready,
}

// ── Edit handles ─────────────────────────────────────────────────

/// How an optimistic edit ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    Committed,
    RolledBack { reason: String },
}

/// An edit that is applied locally and being committed remotely.
#[derive(Debug)]
pub struct PendingEdit {
    pub command: EditCommand,
    handle: JoinHandle<EditOutcome>,
}

impl PendingEdit {
    /// Wait for the remote commit to settle.
    pub async fn outcome(self) -> Result<EditOutcome, CoreError> {
        self.handle
            .await
            .map_err(|e| CoreError::Internal(format!("edit task failed: {e}")))
    }
}

// ── SyncController ───────────────────────────────────────────────

/// Entry point for front ends.
///
/// Cheaply cloneable via `Arc<ControllerInner>`. All collaborators are
/// injected at construction.
pub struct SyncController<G: RemoteGateway> {
    inner: Arc<ControllerInner<G>>,
}

impl<G: RemoteGateway> Clone for SyncController<G> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct ControllerInner<G> {
    gateway: G,
    config: SyncConfig,
    store: SiteStore,
    cache: SiteCache,
    highlights: HighlightSet,
    projector: ViewProjector,
    debouncer: Debouncer,
    filter: watch::Sender<FilterState>,
    selected: watch::Sender<Option<SiteId>>,
    load_state: watch::Sender<LoadState>,
    warnings: Mutex<Vec<String>>,
    cancel: CancellationToken,
}

impl<G: RemoteGateway> SyncController<G> {
    /// Build a controller. `persistence` holds both the site cache and
    /// the highlight set under separate keys.
    pub fn new(
        gateway: G,
        persistence: Arc<dyn KeyValueStore>,
        adapter: Arc<dyn RenderAdapter>,
        config: SyncConfig,
    ) -> Self {
        let cache = SiteCache::new(Arc::clone(&persistence), config.staleness);
        let highlights = HighlightSet::load(persistence);
        let projector = ViewProjector::new(adapter, config.marker.clone());
        let (filter, _) = watch::channel(FilterState::default());
        let (selected, _) = watch::channel(None);
        let (load_state, _) = watch::channel(LoadState::Idle);

        Self {
            inner: Arc::new(ControllerInner {
                gateway,
                config,
                store: SiteStore::new(),
                cache,
                highlights,
                projector,
                debouncer: Debouncer::new(),
                filter,
                selected,
                load_state,
                warnings: Mutex::new(Vec::new()),
                cancel: CancellationToken::new(),
            }),
        }
    }

    // ── Accessors ────────────────────────────────────────────────

    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    pub fn gateway(&self) -> &G {
        &self.inner.gateway
    }

    pub fn store(&self) -> &SiteStore {
        &self.inner.store
    }

    pub fn cache(&self) -> &SiteCache {
        &self.inner.cache
    }

    pub fn highlights(&self) -> &HighlightSet {
        &self.inner.highlights
    }

    pub fn projector(&self) -> &ViewProjector {
        &self.inner.projector
    }

    pub fn filter(&self) -> FilterState {
        self.inner.filter.borrow().clone()
    }

    pub fn selected(&self) -> Option<SiteId> {
        *self.inner.selected.borrow()
    }

    pub fn load_state(&self) -> LoadState {
        *self.inner.load_state.borrow()
    }

    pub fn subscribe_load_state(&self) -> watch::Receiver<LoadState> {
        self.inner.load_state.subscribe()
    }

    pub fn subscribe_projection(&self) -> watch::Receiver<Arc<Projection>> {
        self.inner.projector.subscribe()
    }

    pub fn latest_projection(&self) -> Arc<Projection> {
        self.inner.projector.latest()
    }

    /// Drain the degraded-path messages collected so far.
    pub fn take_warnings(&self) -> Vec<String> {
        let mut warnings = self
            .inner
            .warnings
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *warnings)
    }

    // ── Load protocol ────────────────────────────────────────────

    /// Serve the cache (if any) synchronously, then revalidate against
    /// the remote store in the background.
    ///
    /// Must be called from within a Tokio runtime. The returned handle
    /// resolves once revalidation has settled.
    pub fn start(&self) -> JoinHandle<Result<usize, CoreError>> {
        self.load_cached();

        let ctrl = self.clone();
        let cancel = self.inner.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                result = ctrl.revalidate() => result,
                () = cancel.cancelled() => Err(CoreError::Internal("controller shut down".into())),
            }
        })
    }

    /// The cache-check phase on its own: serve the cached snapshot, if
    /// any, without contacting the remote store.
    pub fn load_cached(&self) -> bool {
        self.set_load_state(LoadState::CacheCheck);
        let served = self.serve_cache();
        self.set_load_state(if served {
            LoadState::ServingCache
        } else {
            LoadState::Fetching
        });
        served
    }

    /// Populate the store from the cache. Returns whether anything was
    /// served. A stale snapshot is still served as a provisional value.
    fn serve_cache(&self) -> bool {
        let snapshot = match self.inner.cache.read() {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => return false,
            Err(e) => {
                self.push_warning(format!("site cache unreadable: {e}"));
                return false;
            }
        };

        if snapshot.fresh {
            info!(count = snapshot.sites.len(), "serving fresh cache");
        } else {
            info!(
                count = snapshot.sites.len(),
                age_secs = snapshot.age.as_secs(),
                "serving stale cache while revalidating"
            );
        }
        self.inner.store.replace_all(snapshot.sites);
        self.request_projection();
        true
    }

    /// Fetch every site from the remote store and replace the store.
    ///
    /// On failure the store is left alone if it has something to show;
    /// otherwise it is emptied and the user is told. The error is
    /// returned either way.
    pub async fn revalidate(&self) -> Result<usize, CoreError> {
        if self.inner.store.is_empty() {
            self.set_load_state(LoadState::Fetching);
        } else {
            self.set_load_state(LoadState::ServingCache);
        }

        let result = self.inner.gateway.fetch_all().await;
        let outcome = match result {
            Ok(rows) => {
                let sites = normalize_records(&rows);
                Ok(self.apply_load(sites))
            }
            Err(e) => {
                self.handle_load_failure(&e);
                Err(e)
            }
        };
        self.set_load_state(LoadState::Ready);
        outcome
    }

    fn apply_load(&self, sites: Vec<Site>) -> usize {
        let count = self.inner.store.replace_all(sites);
        let snapshot = self.inner.store.snapshot();
        if let Err(e) = self.inner.cache.store_at(&snapshot, Utc::now()) {
            self.push_warning(format!("site cache not written: {e}"));
        }
        info!(count, "loaded sites from remote store");
        self.request_projection();
        count
    }

    fn handle_load_failure(&self, err: &CoreError) {
        if self.inner.store.is_empty() {
            warn!(error = %err, "remote load failed with nothing cached");
            self.inner.store.clear();
            self.request_projection();
            self.inner.projector.adapter().notify(&UserNotice::LoadFailed {
                reason: err.to_string(),
            });
        } else {
            warn!(
                error = %err,
                count = self.inner.store.len(),
                "remote load failed, keeping cached sites"
            );
        }
        self.push_warning(format!("remote load failed: {err}"));
    }

    // ── Projection triggers ──────────────────────────────────────

    /// Replace the filters; the projection follows after the debounce
    /// window, using whatever filters are current when it fires.
    pub fn set_filter(&self, filter: FilterState) {
        debug!(%filter, "filter changed");
        self.inner.filter.send_replace(filter);
        self.request_projection();
    }

    /// Schedule a projection pass on the filter-change channel.
    pub fn request_projection(&self) {
        let weak = Arc::downgrade(&self.inner);
        self.inner.debouncer.schedule(
            DebounceKey::FilterChange,
            self.inner.config.filter_debounce,
            move || {
                if let Some(ctrl) = upgrade(&weak) {
                    ctrl.project_now();
                }
            },
        );
    }

    /// Schedule a marker resize on the zoom channel.
    pub fn on_zoom_end(&self) {
        let weak = Arc::downgrade(&self.inner);
        self.inner.debouncer.schedule(
            DebounceKey::ZoomResize,
            self.inner.config.zoom_debounce,
            move || {
                if let Some(ctrl) = upgrade(&weak) {
                    let zoom = ctrl.inner.projector.adapter().current_zoom();
                    ctrl.inner.projector.resize(zoom);
                }
            },
        );
    }

    /// Run a projection pass immediately, dropping any pending one.
    pub fn project_now(&self) -> Arc<Projection> {
        self.inner.debouncer.cancel(DebounceKey::FilterChange);
        let sites = self.inner.store.snapshot();
        let highlights = self.inner.highlights.snapshot();
        let filter = self.filter();
        self.inner.projector.render(&sites, &highlights, &filter)
    }

    // ── Highlights ───────────────────────────────────────────────

    pub fn is_highlighted(&self, id: SiteId) -> bool {
        self.inner.highlights.is_highlighted(id)
    }

    /// Flip the highlight of `id`. Returns the new membership.
    pub fn toggle_highlight(&self, id: SiteId) -> bool {
        let toggle = self.inner.highlights.toggle(id);
        if let Some(e) = toggle.persist_error {
            self.push_warning(format!("highlight for site {id} not saved: {e}"));
        }

        if matches!(self.inner.filter.borrow().status, StatusFilter::HighlightedOnly) {
            self.request_projection();
        } else if let Some(site) = self.inner.store.get(id) {
            self.inner.projector.restyle(&site, toggle.highlighted);
        }
        toggle.highlighted
    }

    // ── Editing ──────────────────────────────────────────────────

    /// Select a site for editing (marker interaction).
    pub fn open_editor(&self, id: SiteId) -> Result<EditorView, CoreError> {
        let site = self
            .inner
            .store
            .get(id)
            .ok_or(CoreError::SiteNotFound { id })?;
        self.inner.selected.send_replace(Some(id));
        debug!(site_id = %id, "editor opened");
        Ok(EditorView::new(&site, self.is_highlighted(id)))
    }

    pub fn close_editor(&self) {
        self.inner.selected.send_replace(None);
    }

    /// Apply `draft` to the selected site now and commit it in the
    /// background. Returns `Ok(None)` when nothing is selected.
    ///
    /// The store, the cache and the site's marker reflect the edit before
    /// this returns. If the remote store refuses it, the site's previous
    /// values are restored and a notice is raised; the cache keeps the
    /// edit until the next load replaces it.
    pub fn submit_edit(&self, draft: &EditDraft) -> Result<Option<PendingEdit>, CoreError> {
        let Some(id) = self.selected() else {
            debug!("edit submitted with no site selected");
            return Ok(None);
        };
        let site = self
            .inner
            .store
            .get(id)
            .ok_or(CoreError::SiteNotFound { id })?;

        let command = EditCommand::new(&site, draft.resolve());
        self.apply_edit(id, &command.after);
        if let Err(e) = self
            .inner
            .cache
            .rewrite_sites(&self.inner.store.snapshot(), Utc::now())
        {
            self.push_warning(format!("site cache not updated after edit: {e}"));
        }
        info!(site_id = %id, status = %command.after.status, "edit applied locally");

        let ctrl = self.clone();
        let task_command = command.clone();
        let handle = tokio::spawn(async move { ctrl.commit(task_command).await });
        Ok(Some(PendingEdit { command, handle }))
    }

    async fn commit(&self, command: EditCommand) -> EditOutcome {
        let body = command.commit_body();
        match self.inner.gateway.update_one(command.id, &body).await {
            Ok(_) => {
                info!(site_id = %command.id, "edit committed");
                if self.selected() == Some(command.id) {
                    self.close_editor();
                }
                EditOutcome::Committed
            }
            Err(e) => {
                warn!(site_id = %command.id, error = %e, "edit rejected, rolling back");
                self.apply_edit(command.id, &command.before);
                let name = self
                    .inner
                    .store
                    .get(command.id)
                    .map(|s| s.name.clone())
                    .unwrap_or_default();
                self.inner.projector.adapter().notify(&UserNotice::EditFailed {
                    id: command.id,
                    name,
                    reason: e.to_string(),
                });
                self.push_warning(format!("edit to site {} rolled back: {e}", command.id));
                EditOutcome::RolledBack {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// The one setter for editable fields, used to apply and to revert.
    /// Recolors only the affected marker.
    fn apply_edit(&self, id: SiteId, edit: &SiteEdit) {
        if self.inner.store.apply_edit(id, edit).is_none() {
            debug!(site_id = %id, "site vanished before edit could be applied");
            return;
        }
        if let Some(site) = self.inner.store.get(id) {
            self.inner.projector.restyle(&site, self.is_highlighted(id));
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Stop background work. Pending debounced passes are dropped and an
    /// in-flight revalidation is abandoned.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
        self.inner.debouncer.shutdown();
        debug!("controller shut down");
    }

    // ── Private helpers ──────────────────────────────────────────

    fn set_load_state(&self, state: LoadState) {
        let previous = self.inner.load_state.send_replace(state);
        if previous != state {
            debug!(from = %previous, to = %state, "load state");
        }
    }

    fn push_warning(&self, message: String) {
        self.inner
            .warnings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
    }
}

fn upgrade<G: RemoteGateway>(weak: &Weak<ControllerInner<G>>) -> Option<SyncController<G>> {
    weak.upgrade().map(|inner| SyncController { inner })
}
