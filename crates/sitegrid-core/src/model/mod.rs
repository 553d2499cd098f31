// ── Domain model ──
//
// Canonical site types shared by the store, cache, projector and
// controller. Raw rows from the remote table are normalized into these
// in `convert`.

mod site;
mod site_id;
mod status;
mod zone;

pub use site::{LatLng, Site};
pub use site_id::SiteId;
pub use status::Status;
pub use zone::{MAX_ZONE, normalize_zone, zone_numeral};
