// ── Highlight set ──
//
// Durable set of starred site ids with its own lifecycle: it survives
// reloads and cache expiry. Every toggle re-serializes the whole set.
// A persistence failure keeps the in-memory change and is reported to
// the caller.

use std::collections::BTreeSet;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::{debug, warn};

use crate::error::PersistenceError;
use crate::model::SiteId;
use crate::persist::KeyValueStore;

/// Storage key of the highlighted id list.
pub const HIGHLIGHT_KEY: &str = "highlighted_sites";

/// Result of a toggle.
#[derive(Debug)]
pub struct Toggle {
    /// Membership after the toggle.
    pub highlighted: bool,
    /// Set when the new state could not be written.
    pub persist_error: Option<PersistenceError>,
}

pub struct HighlightSet {
    backend: Arc<dyn KeyValueStore>,
    ids: ArcSwap<BTreeSet<SiteId>>,
}

impl HighlightSet {
    /// Load the set from `backend`. Unreadable or unparseable entries
    /// yield an empty set.
    pub fn load(backend: Arc<dyn KeyValueStore>) -> Self {
        let ids = match backend.get(HIGHLIGHT_KEY) {
            Ok(Some(raw)) => serde_json::from_str::<Vec<SiteId>>(&raw)
                .map(|ids| ids.into_iter().collect())
                .unwrap_or_else(|e| {
                    warn!(error = %e, "discarding unreadable highlight set");
                    BTreeSet::new()
                }),
            Ok(None) => BTreeSet::new(),
            Err(e) => {
                warn!(error = %e, "highlight set unavailable, starting empty");
                BTreeSet::new()
            }
        };
        debug!(count = ids.len(), "loaded highlight set");

        Self {
            backend,
            ids: ArcSwap::from_pointee(ids),
        }
    }

    pub fn is_highlighted(&self, id: SiteId) -> bool {
        self.ids.load().contains(&id)
    }

    /// Flip membership of `id` and persist the full set.
    pub fn toggle(&self, id: SiteId) -> Toggle {
        let previous = self.ids.rcu(|current| {
            let mut next = BTreeSet::clone(current);
            if !next.remove(&id) {
                next.insert(id);
            }
            next
        });
        let highlighted = !previous.contains(&id);
        debug!(site_id = %id, highlighted, "toggled highlight");

        let persist_error = self.persist().err();
        if let Some(ref e) = persist_error {
            warn!(site_id = %id, error = %e, "highlight change not persisted");
        }
        Toggle {
            highlighted,
            persist_error,
        }
    }

    /// Current members in ascending id order.
    pub fn ids(&self) -> Vec<SiteId> {
        self.ids.load().iter().copied().collect()
    }

    /// Cheap shared view of the current set.
    pub fn snapshot(&self) -> Arc<BTreeSet<SiteId>> {
        self.ids.load_full()
    }

    pub fn len(&self) -> usize {
        self.ids.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.load().is_empty()
    }

    fn persist(&self) -> Result<(), PersistenceError> {
        let ids = self.ids();
        let raw = serde_json::to_string(&ids).map_err(|source| PersistenceError::Encode {
            key: HIGHLIGHT_KEY.into(),
            source,
        })?;
        self.backend.set(HIGHLIGHT_KEY, &raw)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::persist::{FileStore, MemoryStore};

    #[test]
    fn toggle_flips_and_reports_membership() {
        let set = HighlightSet::load(Arc::new(MemoryStore::new()));
        let id = SiteId::new(7);

        assert!(!set.is_highlighted(id));
        assert!(set.toggle(id).highlighted);
        assert!(set.is_highlighted(id));
        assert!(!set.toggle(id).highlighted);
        assert!(!set.is_highlighted(id));
    }

    #[test]
    fn every_toggle_is_persisted() {
        let backend = Arc::new(MemoryStore::new());
        let set = HighlightSet::load(backend.clone());
        set.toggle(SiteId::new(9));
        set.toggle(SiteId::new(2));
        assert_eq!(backend.get(HIGHLIGHT_KEY).unwrap().as_deref(), Some("[2,9]"));

        let reloaded = HighlightSet::load(backend);
        assert_eq!(reloaded.ids(), vec![SiteId::new(2), SiteId::new(9)]);
    }

    #[test]
    fn garbage_loads_as_empty() {
        let backend = Arc::new(MemoryStore::new());
        backend.set(HIGHLIGHT_KEY, "{\"oops\":true}").unwrap();
        assert!(HighlightSet::load(backend).is_empty());
    }

    #[test]
    fn write_failure_keeps_in_memory_state() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "not a dir").unwrap();
        let set = HighlightSet::load(Arc::new(FileStore::new(&blocker)));

        let outcome = set.toggle(SiteId::new(3));
        assert!(outcome.highlighted);
        assert!(outcome.persist_error.is_some());
        assert!(set.is_highlighted(SiteId::new(3)));
    }
}
