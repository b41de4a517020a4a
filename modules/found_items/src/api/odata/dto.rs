use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::rest::dto::rfc3339;
use crate::contract::model::{FoundItem, QueryPage};

/// Flat OData projection of a found item; keys are the storage column names.
/// Absent optional text is rendered as an empty string.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ODataFoundItem {
    pub id: String,
    pub municipality_name: String,
    pub municipality_type: String,
    pub municipality_email: String,
    pub item_name: String,
    pub item_category: String,
    pub item_date: String,
    pub item_location: String,
    pub item_status: String,
    pub item_description: String,
    pub pickup_deadline: i64,
    pub pickup_location: String,
    pub pickup_hours: String,
    pub pickup_contact: String,
    pub categories: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Collection envelope in the OData v3 JSON "verbose-light" style.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ODataCollection {
    #[serde(rename = "odata.context")]
    pub context: String,
    pub value: Vec<ODataFoundItem>,
    /// Present only when `$count=true` was requested.
    #[serde(rename = "odata.count", skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
}

impl ODataCollection {
    pub fn new(context: impl Into<String>, page: QueryPage) -> Self {
        Self {
            context: context.into(),
            value: page.items.into_iter().map(Into::into).collect(),
            count: page.count,
        }
    }
}

impl From<FoundItem> for ODataFoundItem {
    fn from(i: FoundItem) -> Self {
        Self {
            id: i.id,
            municipality_name: i.municipality.name,
            municipality_type: i.municipality.kind,
            municipality_email: i.municipality.contact_email,
            item_name: i.item.name,
            item_category: i.item.category,
            item_date: i.item.date,
            item_location: i.item.location,
            item_status: i.item.status.to_string(),
            item_description: i.item.description.unwrap_or_default(),
            pickup_deadline: i.pickup.deadline_days,
            pickup_location: i.pickup.location,
            pickup_hours: i.pickup.hours.unwrap_or_default(),
            pickup_contact: i.pickup.contact.unwrap_or_default(),
            categories: i.categories,
            created_at: rfc3339(i.created_at),
            updated_at: rfc3339(i.updated_at),
        }
    }
}
