// ── Entity store ──
//
// Ordered, reactive storage for the current working copy of all sites.

mod site_store;

pub use site_store::SiteStore;
