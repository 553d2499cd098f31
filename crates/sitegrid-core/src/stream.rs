// ── Reactive site streams ──
//
// Subscription handle for consuming store changes.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::Site;

type Snapshot = Arc<Vec<Arc<Site>>>;

/// A subscription to the site store.
///
/// Provides both point-in-time snapshot access and reactive change
/// notification via `changed()` or by converting to a `Stream`.
pub struct SiteStream {
    current: Snapshot,
    receiver: watch::Receiver<Snapshot>,
}

impl SiteStream {
    pub(crate) fn new(receiver: watch::Receiver<Snapshot>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// The snapshot captured at creation or at the last `changed()`.
    pub fn current(&self) -> &Snapshot {
        &self.current
    }

    /// The latest snapshot (may have changed since creation).
    pub fn latest(&self) -> Snapshot {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change, returning the new snapshot.
    /// Returns `None` if the store has been dropped.
    pub async fn changed(&mut self) -> Option<Snapshot> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    pub fn into_stream(self) -> SiteWatchStream {
        SiteWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter yielding a snapshot each time the store changes.
pub struct SiteWatchStream {
    inner: WatchStream<Snapshot>,
}

impl Stream for SiteWatchStream {
    type Item = Snapshot;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use futures_util::StreamExt;

    use crate::model::{Site, SiteId, Status};
    use crate::store::SiteStore;

    fn site(id: i64) -> Site {
        Site {
            id: SiteId::new(id),
            name: format!("site {id}"),
            latitude: None,
            longitude: None,
            star_rating: None,
            zone: 0,
            status: Status::Unset,
            phase: None,
            notes: None,
            address: None,
            capacity: None,
        }
    }

    #[tokio::test]
    async fn stream_yields_initial_then_updates() {
        let store = SiteStore::new();
        let mut stream = store.subscribe().into_stream();

        let initial = stream.next().await.unwrap();
        assert!(initial.is_empty());

        store.replace_all(vec![site(1), site(2)]);
        let updated = stream.next().await.unwrap();
        assert_eq!(updated.len(), 2);
    }

    #[test]
    fn current_is_fixed_until_changed() {
        let store = SiteStore::new();
        let stream = store.subscribe();
        store.replace_all(vec![site(1)]);
        assert!(stream.current().is_empty());
        assert_eq!(stream.latest().len(), 1);
    }
}
