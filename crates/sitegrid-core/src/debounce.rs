// ── Keyed debouncer ──
//
// Each key holds at most one pending task. Scheduling under a key aborts
// whatever was pending there, so the last request within the window is
// the one that runs. Keys are independent of each other.

use std::time::Duration;

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Debounce channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum DebounceKey {
    /// Filter changes and load completion: full projection pass.
    FilterChange,
    /// Zoom end: in-place marker resize.
    ZoomResize,
}

pub struct Debouncer {
    pending: DashMap<DebounceKey, JoinHandle<()>>,
    cancel: CancellationToken,
}

impl Debouncer {
    pub fn new() -> Self {
        Self {
            pending: DashMap::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Run `task` after `delay` unless another task is scheduled under
    /// the same key first. Must be called from within a Tokio runtime.
    pub fn schedule<F>(&self, key: DebounceKey, delay: Duration, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let cancel = self.cancel.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                () = tokio::time::sleep(delay) => {
                    trace!(%key, "debounce fired");
                    task();
                }
                () = cancel.cancelled() => {}
            }
        });
        if let Some(previous) = self.pending.insert(key, handle) {
            previous.abort();
            trace!(%key, "debounce rescheduled");
        }
    }

    /// Drop a pending task without running it. Returns whether one was
    /// still waiting.
    pub fn cancel(&self, key: DebounceKey) -> bool {
        self.pending.remove(&key).is_some_and(|(_, handle)| {
            let waiting = !handle.is_finished();
            handle.abort();
            waiting
        })
    }

    pub fn is_pending(&self, key: DebounceKey) -> bool {
        self.pending.get(&key).is_some_and(|h| !h.is_finished())
    }

    /// Cancel every pending task; later `schedule` calls never fire.
    pub fn shutdown(&self) {
        self.cancel.cancel();
        self.pending.retain(|_, handle| {
            handle.abort();
            false
        });
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        for entry in &self.pending {
            entry.value().abort();
        }
    }
}
