// ── Ordered reactive site store ──
//
// Insertion-ordered map swapped atomically on every mutation, with
// push-based change notification via `watch` channels. Readers never
// block; the projector iterates the order of the last load.

use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::command::SiteEdit;
use crate::model::{Site, SiteId};
use crate::stream::SiteStream;

type SiteMap = IndexMap<SiteId, Arc<Site>>;

/// Single source of truth for the sites of the current process.
///
/// Every mutation publishes a fresh map, bumps the version counter and
/// rebuilds the snapshot that subscribers receive.
pub struct SiteStore {
    sites: ArcSwap<SiteMap>,
    version: watch::Sender<u64>,
    snapshot: watch::Sender<Arc<Vec<Arc<Site>>>>,
    last_replaced: watch::Sender<Option<DateTime<Utc>>>,
}

impl SiteStore {
    pub fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        let (last_replaced, _) = watch::channel(None);

        Self {
            sites: ArcSwap::from_pointee(IndexMap::new()),
            version,
            snapshot,
            last_replaced,
        }
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Replace the whole store, keeping the incoming order. A duplicate id
    /// keeps its first position and takes the later record.
    pub fn replace_all(&self, sites: Vec<Site>) -> usize {
        let mut map = SiteMap::with_capacity(sites.len());
        for site in sites {
            let id = site.id;
            if map.insert(id, Arc::new(site)).is_some() {
                warn!(site_id = %id, "duplicate site id in load, keeping the later record");
            }
        }
        let count = map.len();
        self.sites.store(Arc::new(map));
        self.last_replaced.send_modify(|ts| *ts = Some(Utc::now()));
        self.publish();
        debug!(count, "site store replaced");
        count
    }

    /// Apply the editable fields to one site. Returns the fields it held
    /// before, or `None` if the id is unknown.
    ///
    /// This is the single setter used both to apply an edit and to roll
    /// it back.
    pub fn apply_edit(&self, id: SiteId, edit: &SiteEdit) -> Option<SiteEdit> {
        let current = self.sites.load();
        let existing = current.get(&id)?;
        let previous = SiteEdit::of(existing);

        let mut updated = Site::clone(existing);
        edit.apply_to(&mut updated);

        let mut map = SiteMap::clone(&current);
        map.insert(id, Arc::new(updated));
        self.sites.store(Arc::new(map));
        self.publish();
        Some(previous)
    }

    /// Remove every site.
    pub fn clear(&self) {
        self.sites.store(Arc::new(IndexMap::new()));
        self.publish();
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn get(&self, id: SiteId) -> Option<Arc<Site>> {
        self.sites.load().get(&id).cloned()
    }

    pub fn contains(&self, id: SiteId) -> bool {
        self.sites.load().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.sites.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.load().is_empty()
    }

    /// Current sites in load order (cheap `Arc` clone).
    pub fn snapshot(&self) -> Arc<Vec<Arc<Site>>> {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes.
    pub fn subscribe(&self) -> SiteStream {
        SiteStream::new(self.snapshot.subscribe())
    }

    /// Mutation counter; increases by one per published change.
    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }

    /// When the store was last replaced wholesale.
    pub fn last_replaced(&self) -> Option<DateTime<Utc>> {
        *self.last_replaced.borrow()
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn publish(&self) {
        let values: Vec<Arc<Site>> = self.sites.load().values().cloned().collect();
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
        self.version.send_modify(|v| *v += 1);
    }
}

impl Default for SiteStore {
    fn default() -> Self {
        Self::new()
    }
}
