use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a registered item.
///
/// Writes accept only the known states; rows written by other tools may carry
/// any text, which is kept as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ItemStatus {
    #[default]
    Available,
    Claimed,
    Expired,
    Other(String),
}

impl ItemStatus {
    pub const KNOWN: [ItemStatus; 3] = [Self::Available, Self::Claimed, Self::Expired];

    pub fn as_str(&self) -> &str {
        match self {
            Self::Available => "available",
            Self::Claimed => "claimed",
            Self::Expired => "expired",
            Self::Other(raw) => raw,
        }
    }

    /// Lenient read of a stored value.
    pub fn from_stored(raw: &str) -> Self {
        raw.parse().unwrap_or_else(|_| Self::Other(raw.to_owned()))
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown item status '{0}'")]
pub struct UnknownStatus(pub String);

/// Strict: only the known states parse.
impl FromStr for ItemStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::KNOWN
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// Pure domain model shared with other modules (no serde).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundItem {
    pub id: String,
    pub municipality: MunicipalityInfo,
    pub item: ItemInfo,
    pub pickup: PickupInfo,
    pub categories: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The office that registered the item.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MunicipalityInfo {
    pub name: String,
    pub kind: String,
    pub contact_email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemInfo {
    pub name: String,
    pub category: String,
    /// Date the item was found, as submitted.
    pub date: String,
    pub location: String,
    pub status: ItemStatus,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PickupInfo {
    /// Days the owner has to collect the item.
    pub deadline_days: i64,
    pub location: String,
    pub hours: Option<String>,
    pub contact: Option<String>,
}

/// Item section of a submission. Status arrives as text and is checked by
/// the service; absent or blank means `available`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ItemInput {
    pub name: String,
    pub category: String,
    pub date: String,
    pub location: String,
    pub status: Option<String>,
    pub description: Option<String>,
}

/// Data for registering a new item.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewFoundItem {
    pub municipality: MunicipalityInfo,
    pub item: ItemInput,
    pub pickup: PickupInfo,
    pub categories: Vec<String>,
}

/// Partial update: each present section replaces the stored one wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FoundItemPatch {
    pub municipality: Option<MunicipalityInfo>,
    pub item: Option<ItemInput>,
    pub pickup: Option<PickupInfo>,
    pub categories: Option<Vec<String>>,
}

impl FoundItemPatch {
    pub fn is_empty(&self) -> bool {
        self.municipality.is_none()
            && self.item.is_none()
            && self.pickup.is_none()
            && self.categories.is_none()
    }
}

/// Criteria of the REST listing. Empty strings mean "not set".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListFilters {
    pub category: Option<String>,
    pub municipality: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
}

/// One page of an OData query, with the total when `$count` was requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPage {
    pub items: Vec<FoundItem>,
    pub count: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryOption {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RegistryStats {
    pub total: i64,
    pub available: i64,
    pub claimed: i64,
    /// `(category, count)`, most frequent first.
    pub top_categories: Vec<(String, i64)>,
    /// `(municipality name, count)`, most frequent first.
    pub top_municipalities: Vec<(String, i64)>,
}
