//! Sync and view-projection engine between `sitegrid-api` and front ends.
//!
//! - **[`SyncController`]**: Central facade. [`start()`](SyncController::start)
//!   serves the cached snapshot synchronously and revalidates against the
//!   remote store in the background; [`submit_edit()`](SyncController::submit_edit)
//!   applies an edit optimistically and rolls it back if the commit fails.
//!
//! - **[`SiteStore`]**: Insertion-ordered reactive storage (`ArcSwap` +
//!   `tokio::sync::watch`), subscribed to through [`SiteStream`].
//!
//! - **[`SiteCache`] / [`HighlightSet`]**: Two independently keyed durable
//!   entries over a [`KeyValueStore`] ([`FileStore`] or [`MemoryStore`]).
//!
//! - **[`project`] / [`ViewProjector`]**: Pure projection of sites,
//!   highlights, filters and zoom to marker descriptors, pushed to a
//!   [`RenderAdapter`] behind a keyed [`Debouncer`].

pub mod cache;
pub mod command;
pub mod config;
pub mod controller;
pub mod convert;
pub mod debounce;
pub mod editor;
pub mod error;
pub mod filter;
pub mod highlight;
pub mod model;
pub mod persist;
pub mod projector;
pub mod render;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use cache::{CacheSnapshot, SITES_CACHE_KEY, SiteCache};
pub use command::{EditCommand, EditDraft, SiteEdit};
pub use config::{MarkerStyleConfig, SyncConfig};
pub use controller::{EditOutcome, LoadState, PendingEdit, RemoteGateway, SyncController};
pub use debounce::{DebounceKey, Debouncer};
pub use editor::EditorView;
pub use error::{CoreError, PersistenceError, ProjectionSkip};
pub use filter::{FilterParseError, FilterState, PhaseFilter, StarFilter, StatusFilter, ZoneFilter};
pub use highlight::{HIGHLIGHT_KEY, HighlightSet, Toggle};
pub use model::{LatLng, Site, SiteId, Status};
pub use persist::{FileStore, KeyValueStore, MemoryStore};
pub use projector::{Projection, ViewProjector, project};
pub use render::{EmptyZoneNotice, MarkerBoard, MarkerDescriptor, MarkerStyle, RenderAdapter, UserNotice};
pub use store::SiteStore;
pub use stream::SiteStream;
