use anyhow::Context;
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{debug, warn};

use crate::contract::model::{FoundItem, ItemInfo, ItemStatus, MunicipalityInfo, PickupInfo};

/// Text form of `datetime('now')`, used for every timestamp we write.
pub const DB_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One `found_items` row, columns in `fields::COLUMNS` order.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FoundItemRow {
    pub id: String,
    pub municipality_name: String,
    pub municipality_type: String,
    pub municipality_email: String,
    pub item_name: String,
    pub item_category: String,
    pub item_date: String,
    pub item_location: String,
    pub item_status: String,
    pub item_description: Option<String>,
    pub pickup_deadline: i64,
    pub pickup_location: String,
    pub pickup_hours: Option<String>,
    pub pickup_contact: Option<String>,
    pub categories: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

pub fn format_db_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(DB_TIMESTAMP_FORMAT).to_string()
}

/// `YYYY-MM-DD HH:MM:SS` first, then RFC 3339. Anything else maps to the Unix
/// epoch so one bad row does not fail the whole query.
pub fn parse_db_timestamp(raw: &str) -> DateTime<Utc> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, DB_TIMESTAMP_FORMAT) {
        return naive.and_utc();
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return ts.with_timezone(&Utc);
    }
    warn!(value = %raw, "unparsable timestamp in found_items; using epoch");
    DateTime::<Utc>::UNIX_EPOCH
}

/// Categories are a JSON array; NULL, empty or malformed text reads as no tags.
pub fn parse_categories(raw: Option<&str>) -> Vec<String> {
    match raw.map(str::trim) {
        None | Some("") => Vec::new(),
        Some(text) => serde_json::from_str(text).unwrap_or_else(|e| {
            warn!(error = %e, "malformed categories column; ignoring");
            Vec::new()
        }),
    }
}

pub fn categories_json(categories: &[String]) -> anyhow::Result<String> {
    serde_json::to_string(categories).context("encode categories failed")
}

/// Convert a database row to a contract model. Unknown statuses are kept
/// verbatim so one odd row does not fail the whole query.
pub fn row_to_contract(row: FoundItemRow) -> FoundItem {
    let status = ItemStatus::from_stored(&row.item_status);
    if let ItemStatus::Other(raw) = &status {
        debug!(id = %row.id, status = %raw, "found item has a non-standard status");
    }

    FoundItem {
        municipality: MunicipalityInfo {
            name: row.municipality_name,
            kind: row.municipality_type,
            contact_email: row.municipality_email,
        },
        item: ItemInfo {
            name: row.item_name,
            category: row.item_category,
            date: row.item_date,
            location: row.item_location,
            status,
            description: row.item_description,
        },
        pickup: PickupInfo {
            deadline_days: row.pickup_deadline,
            location: row.pickup_location,
            hours: row.pickup_hours,
            contact: row.pickup_contact,
        },
        categories: parse_categories(row.categories.as_deref()),
        created_at: parse_db_timestamp(&row.created_at),
        updated_at: parse_db_timestamp(&row.updated_at),
        id: row.id,
    }
}
