// ── Persistent site cache ──
//
// One durable entry holding the last known site list and when it was
// captured. Fresh while younger than the staleness threshold; a stale
// snapshot is still served as a provisional value. Unparseable entries
// are a miss, never an error.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::PersistenceError;
use crate::model::Site;
use crate::persist::KeyValueStore;

/// Storage key of the site snapshot.
pub const SITES_CACHE_KEY: &str = "sites_cache";

#[derive(Debug, Serialize, Deserialize)]
struct CachedSites {
    captured_at: DateTime<Utc>,
    sites: Vec<Site>,
}

#[derive(Serialize)]
struct CachedSitesRef<'a> {
    captured_at: DateTime<Utc>,
    sites: Vec<&'a Site>,
}

/// A snapshot read back from the cache.
#[derive(Debug, Clone)]
pub struct CacheSnapshot {
    pub sites: Vec<Site>,
    pub captured_at: DateTime<Utc>,
    /// Age at the time of reading; zero if the capture time is in the future.
    pub age: Duration,
    pub fresh: bool,
}

/// Time-boxed cache of the site list.
#[derive(Clone)]
pub struct SiteCache {
    backend: Arc<dyn KeyValueStore>,
    staleness: Duration,
}

impl SiteCache {
    pub fn new(backend: Arc<dyn KeyValueStore>, staleness: Duration) -> Self {
        Self { backend, staleness }
    }

    pub fn staleness(&self) -> Duration {
        self.staleness
    }

    /// Read the snapshot as of now.
    pub fn read(&self) -> Result<Option<CacheSnapshot>, PersistenceError> {
        self.read_at(Utc::now())
    }

    /// Read the snapshot, judging freshness against `now`.
    pub fn read_at(&self, now: DateTime<Utc>) -> Result<Option<CacheSnapshot>, PersistenceError> {
        let Some(raw) = self.backend.get(SITES_CACHE_KEY)? else {
            debug!("no cached sites");
            return Ok(None);
        };

        let cached: CachedSites = match serde_json::from_str(&raw) {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "discarding unreadable site cache");
                return Ok(None);
            }
        };

        let age = (now - cached.captured_at).to_std().unwrap_or(Duration::ZERO);
        let fresh = age < self.staleness;
        debug!(count = cached.sites.len(), age_secs = age.as_secs(), fresh, "read site cache");
        Ok(Some(CacheSnapshot {
            sites: cached.sites,
            captured_at: cached.captured_at,
            age,
            fresh,
        }))
    }

    /// Write a full snapshot captured at `captured_at`.
    pub fn store_at(&self, sites: &[Arc<Site>], captured_at: DateTime<Utc>) -> Result<(), PersistenceError> {
        let payload = CachedSitesRef {
            captured_at,
            sites: sites.iter().map(AsRef::as_ref).collect(),
        };
        let raw = serde_json::to_string(&payload).map_err(|source| PersistenceError::Encode {
            key: SITES_CACHE_KEY.into(),
            source,
        })?;
        self.backend.set(SITES_CACHE_KEY, &raw)?;
        debug!(count = sites.len(), "wrote site cache");
        Ok(())
    }

    /// Rewrite the site list while keeping the existing capture time, so
    /// a local edit does not make an old snapshot look fresh. Falls back
    /// to `now` when there is no readable snapshot.
    pub fn rewrite_sites(&self, sites: &[Arc<Site>], now: DateTime<Utc>) -> Result<(), PersistenceError> {
        let captured_at = self
            .read_at(now)?
            .map_or(now, |snapshot| snapshot.captured_at);
        self.store_at(sites, captured_at)
    }

    /// Remove the snapshot.
    pub fn clear(&self) -> Result<(), PersistenceError> {
        self.backend.remove(SITES_CACHE_KEY)
    }
}
