// Wire types for the remote site table.
//
// Rows are kept as raw JSON objects: the table's column naming is not
// stable (`hotel_name` vs `Hotel_Name`), so normalization belongs to core.

use serde::{Deserialize, Serialize};

/// One row of the remote table, exactly as the server sent it.
pub type RawSiteRecord = serde_json::Map<String, serde_json::Value>;

/// Body of a partial update. Exactly these three columns are written;
/// `None` is sent as an explicit `null` so the column is cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteUpdateBody {
    pub status: String,
    pub phase: Option<u8>,
    pub notes: Option<String>,
}
