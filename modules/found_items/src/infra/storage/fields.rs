//! External field names accepted by the OData endpoint and the columns they map to.

use odata_core::{AllowList, QueryAllowLists};

pub const TABLE: &str = "found_items";

/// Projection shared by every item query, in `FoundItemRow` order.
pub const COLUMNS: [&str; 17] = [
    "id",
    "municipality_name",
    "municipality_type",
    "municipality_email",
    "item_name",
    "item_category",
    "item_date",
    "item_location",
    "item_status",
    "item_description",
    "pickup_deadline",
    "pickup_location",
    "pickup_hours",
    "pickup_contact",
    "categories",
    "created_at",
    "updated_at",
];

pub const FILTERABLE: [&str; 5] = [
    "item_status",
    "item_category",
    "municipality_name",
    "item_name",
    "item_description",
];

pub const ORDERABLE: [&str; 3] = ["created_at", "item_name", "item_date"];

/// Field names equal column names today; the tables stay separate so either
/// side can be renamed.
pub fn allow_lists() -> QueryAllowLists {
    QueryAllowLists::new(
        FILTERABLE.iter().map(|f| (*f, *f)).collect::<AllowList>(),
        ORDERABLE.iter().map(|f| (*f, *f)).collect::<AllowList>(),
    )
}
