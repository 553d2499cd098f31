//! Async Rust client for the remote site table.
//!
//! The remote store is the authoritative copy of every site. This crate
//! only speaks its wire protocol: fetch every row, or partially update
//! one row's status / phase / notes. Normalization into domain types and
//! all caching live in `sitegrid-core`.

pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use client::{DEFAULT_TABLE, SiteTableClient};
pub use error::Error;
pub use models::{RawSiteRecord, SiteUpdateBody};
pub use transport::TransportConfig;
