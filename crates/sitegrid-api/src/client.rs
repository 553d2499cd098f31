// Remote site table HTTP client
//
// Wraps `reqwest::Client` with table-scoped URL construction and
// response validation. The server exposes a REST surface over a single
// table: `GET /api/{table}` for the full list and `PUT /api/{table}/{id}`
// for a partial update of the operator-editable columns.

use serde_json::Value;
use tracing::{debug, trace, warn};
use url::Url;

use crate::error::Error;
use crate::models::{RawSiteRecord, SiteUpdateBody};
use crate::transport::TransportConfig;

/// Default table name served by the backend.
pub const DEFAULT_TABLE: &str = "hotels";

const BODY_PREVIEW_CHARS: usize = 200;

/// Raw HTTP client for the remote site table.
///
/// Cheap to clone (`reqwest::Client` is reference counted). All methods
/// return raw rows; shaping them into domain types is the caller's job.
#[derive(Debug, Clone)]
pub struct SiteTableClient {
    http: reqwest::Client,
    base_url: Url,
    table: String,
}

impl SiteTableClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the server root (e.g. `http://localhost:5000`).
    pub fn new(base_url: Url, table: impl Into<String>, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, table))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, table: impl Into<String>) -> Self {
        Self {
            http,
            base_url,
            table: table.into(),
        }
    }

    /// The server base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The table this client reads and writes.
    pub fn table(&self) -> &str {
        &self.table
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// `{base}/api/{table}`
    pub(crate) fn collection_url(&self) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/api/{}", self.table))?)
    }

    /// `{base}/api/{table}/{id}`
    pub(crate) fn row_url(&self, id: i64) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/api/{}/{id}", self.table))?)
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// Fetch every row of the table.
    ///
    /// `GET /api/{table}`. Fails with [`Error::Format`] when the body is
    /// not a JSON list. Non-object list items are dropped with a warning.
    pub async fn fetch_all(&self) -> Result<Vec<RawSiteRecord>, Error> {
        let url = self.collection_url()?;
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await?;
        let value = Self::parse_json(resp).await?;

        let Value::Array(items) = value else {
            return Err(Error::Format {
                message: "expected a JSON list of rows".into(),
                body: preview(&value.to_string()),
            });
        };

        let total = items.len();
        let rows: Vec<RawSiteRecord> = items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(map) => Some(map),
                other => {
                    warn!(item = %other, "dropping non-object row");
                    None
                }
            })
            .collect();
        trace!(total, kept = rows.len(), "fetched rows");
        Ok(rows)
    }

    /// Partially update one row's operator-editable columns.
    ///
    /// `PUT /api/{table}/{id}` with `{status, phase, notes}`. Returns the
    /// row as stored by the server.
    pub async fn update_one(&self, id: i64, body: &SiteUpdateBody) -> Result<RawSiteRecord, Error> {
        let url = self.row_url(id)?;
        debug!(id, "PUT {}", url);

        let resp = self.http.put(url).json(body).send().await?;
        match Self::parse_json(resp).await? {
            Value::Object(map) => Ok(map),
            other => Err(Error::Format {
                message: "expected the updated row as a JSON object".into(),
                body: preview(&other.to_string()),
            }),
        }
    }

    // ── Response handling ────────────────────────────────────────────

    async fn parse_json(resp: reqwest::Response) -> Result<Value, Error> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                body: preview(&body),
            });
        }

        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| Error::Format {
            message: e.to_string(),
            body: preview(&body),
        })
    }
}

/// First few characters of a body, cut on a char boundary.
fn preview(body: &str) -> String {
    match body.char_indices().nth(BODY_PREVIEW_CHARS) {
        Some((idx, _)) => body[..idx].to_owned(),
        None => body.to_owned(),
    }
}
