// ── Row-to-domain conversion ──
//
// The remote table does not agree with itself on column naming: the same
// attribute can arrive as `hotel_name` or `Hotel_Name`. Every logical
// field is resolved by walking a fixed list of candidate keys and taking
// the first one that carries a value. Numbers are parsed explicitly from
// JSON numbers or numeric strings.

use serde_json::Value;
use tracing::{debug, warn};

use sitegrid_api::RawSiteRecord;

use crate::model::{Site, SiteId, Status, normalize_zone};

// ── Candidate keys, highest priority first ─────────────────────────

const ID_KEYS: &[&str] = &["id", "Id", "ID"];
const NAME_KEYS: &[&str] = &["hotel_name", "Hotel_Name", "name", "Name"];
const LATITUDE_KEYS: &[&str] = &["latitude", "Latitude", "lat"];
const LONGITUDE_KEYS: &[&str] = &["longitude", "Longitude", "lng", "lon"];
const STAR_KEYS: &[&str] = &["star_rating", "Star_Rating", "stars"];
const ZONE_KEYS: &[&str] = &["municipio", "Municipio", "zone"];
const STATUS_KEYS: &[&str] = &["status", "Status"];
const PHASE_KEYS: &[&str] = &["phase", "Phase"];
const NOTES_KEYS: &[&str] = &["notes", "Notes"];
const ADDRESS_KEYS: &[&str] = &["address", "Address"];
const CAPACITY_KEYS: &[&str] = &["capacity", "Capacity", "rooms", "Rooms"];

const STREET_KEYS: &[&str] = &["street", "Street", "via"];
const HOUSE_NUMBER_KEYS: &[&str] = &["house_number", "civico"];
const POSTAL_CODE_KEYS: &[&str] = &["postal_code", "cap", "CAP"];
const CITY_KEYS: &[&str] = &["city", "City", "comune"];

// ── Field resolution ───────────────────────────────────────────────

/// First candidate holding a value. `null` and blank strings count as
/// absent so the next candidate is tried.
fn pick<'a>(row: &'a RawSiteRecord, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().filter_map(|k| row.get(*k)).find(|v| match v {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    })
}

fn pick_str(row: &RawSiteRecord, keys: &[&str]) -> Option<String> {
    pick(row, keys).map(|v| match v {
        Value::String(s) => s.trim().to_owned(),
        other => other.to_string(),
    })
}

fn pick_f64(row: &RawSiteRecord, keys: &[&str]) -> Option<f64> {
    match pick(row, keys)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

/// Integral value from a JSON number or numeric string. Fractional
/// values are rejected rather than truncated.
fn pick_i64(row: &RawSiteRecord, keys: &[&str]) -> Option<i64> {
    match pick(row, keys)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn integral(v: f64) -> Option<i64> {
    (v.is_finite() && v.fract() == 0.0 && v.abs() < 9.0e15).then_some(v as i64)
}

/// Integral numbers and numeric strings first, then zone numerals.
fn pick_zone(row: &RawSiteRecord) -> u32 {
    if let Some(z) = pick_i64(row, ZONE_KEYS) {
        return u32::try_from(z).unwrap_or(0);
    }
    match pick(row, ZONE_KEYS) {
        Some(Value::String(s)) => normalize_zone(s),
        _ => 0,
    }
}

/// Compose an address from its parts when no single address column is set.
fn compose_address(row: &RawSiteRecord) -> Option<String> {
    let street = pick_str(row, STREET_KEYS);
    let number = pick_str(row, HOUSE_NUMBER_KEYS);
    let postal = pick_str(row, POSTAL_CODE_KEYS);
    let city = pick_str(row, CITY_KEYS);

    let first = match (street, number) {
        (Some(s), Some(n)) => Some(format!("{s} {n}")),
        (s, n) => s.or(n),
    };
    let second = match (postal, city) {
        (Some(p), Some(c)) => Some(format!("{p} {c}")),
        (p, c) => p.or(c),
    };
    match (first, second) {
        (Some(a), Some(b)) => Some(format!("{a}, {b}")),
        (a, b) => a.or(b),
    }
}

// ── Public API ─────────────────────────────────────────────────────

/// Normalize one raw row. Returns `None` when the row has no usable id.
pub fn site_from_record(row: &RawSiteRecord) -> Option<Site> {
    let id = SiteId::new(pick_i64(row, ID_KEYS)?);

    let star_rating = pick_i64(row, STAR_KEYS)
        .and_then(|s| u8::try_from(s).ok())
        .filter(|s| (1..=5).contains(s));
    let phase = pick_i64(row, PHASE_KEYS)
        .and_then(|p| u8::try_from(p).ok())
        .filter(|p| *p > 0);
    let capacity = pick_i64(row, CAPACITY_KEYS).and_then(|c| u32::try_from(c).ok());
    let status = pick(row, STATUS_KEYS).map_or(Status::Unset, |v| match v {
        Value::String(s) => Status::from_storage(s),
        other => Status::from_storage(&other.to_string()),
    });

    Some(Site {
        id,
        name: pick_str(row, NAME_KEYS).unwrap_or_default(),
        latitude: pick_f64(row, LATITUDE_KEYS),
        longitude: pick_f64(row, LONGITUDE_KEYS),
        star_rating,
        zone: pick_zone(row),
        status,
        phase,
        notes: pick_str(row, NOTES_KEYS),
        address: pick_str(row, ADDRESS_KEYS).or_else(|| compose_address(row)),
        capacity,
    })
}

/// Normalize a full fetch, preserving row order. Rows without an id are
/// dropped with a warning.
pub fn normalize_records(rows: &[RawSiteRecord]) -> Vec<Site> {
    let sites: Vec<Site> = rows.iter().filter_map(site_from_record).collect();
    let skipped = rows.len() - sites.len();
    if skipped > 0 {
        warn!(skipped, total = rows.len(), "dropped rows without a usable id");
    }
    debug!(count = sites.len(), "normalized rows");
    sites
}
