use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::contract::model::{
    CategoryOption, FoundItem, FoundItemPatch, ItemInput, ListFilters, MunicipalityInfo,
    NewFoundItem, PickupInfo, RegistryStats,
};

pub(crate) fn rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// REST DTO for a registered found item
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FoundItemDto {
    pub id: String,
    pub municipality: MunicipalityDto,
    pub item: ItemDto,
    pub pickup: PickupDto,
    pub categories: Vec<String>,
    /// RFC 3339, UTC.
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct MunicipalityDto {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub contact_email: String,
}

/// Item section, used both in requests and responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct ItemDto {
    pub name: String,
    pub category: String,
    pub date: String,
    pub location: String,
    /// `available`, `claimed` or `expired`. Blank on input means `available`.
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct PickupDto {
    /// Days the owner has to collect the item.
    pub deadline: i64,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
}

/// REST DTO for registering a new item
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct CreateFoundItemReq {
    pub municipality: MunicipalityDto,
    pub item: ItemDto,
    pub pickup: PickupDto,
    pub categories: Vec<String>,
}

/// REST DTO for a partial update; each present section replaces the stored one.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateFoundItemReq {
    pub municipality: Option<MunicipalityDto>,
    pub item: Option<ItemDto>,
    pub pickup: Option<PickupDto>,
    pub categories: Option<Vec<String>>,
}

/// Query string of `GET /api/found-items`. Paging values stay text so bad
/// numbers are clamped instead of failing the request.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListFoundItemsQuery {
    /// Rows to skip (default 0).
    pub skip: Option<String>,
    /// Page size, clamped to 1..=100 (default 50).
    pub limit: Option<String>,
    /// Exact category.
    pub category: Option<String>,
    /// Case-insensitive substring of the municipality name.
    pub municipality: Option<String>,
    /// Exact status.
    pub status: Option<String>,
    /// Case-insensitive substring of name, description or location.
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryOptionDto {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsDto {
    pub found_items: StatusCountsDto,
    pub top_categories: Vec<CategoryCountDto>,
    pub top_municipalities: Vec<MunicipalityCountDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusCountsDto {
    pub total: i64,
    pub available: i64,
    pub claimed: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryCountDto {
    pub category: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MunicipalityCountDto {
    pub name: String,
    pub count: i64,
}

// Conversion implementations between REST DTOs and contract models

impl From<FoundItem> for FoundItemDto {
    fn from(item: FoundItem) -> Self {
        Self {
            id: item.id,
            municipality: item.municipality.into(),
            item: ItemDto {
                name: item.item.name,
                category: item.item.category,
                date: item.item.date,
                location: item.item.location,
                status: item.item.status.to_string(),
                description: item.item.description,
            },
            pickup: item.pickup.into(),
            categories: item.categories,
            created_at: rfc3339(item.created_at),
            updated_at: rfc3339(item.updated_at),
        }
    }
}

impl From<MunicipalityInfo> for MunicipalityDto {
    fn from(m: MunicipalityInfo) -> Self {
        Self {
            name: m.name,
            kind: m.kind,
            contact_email: m.contact_email,
        }
    }
}

impl From<MunicipalityDto> for MunicipalityInfo {
    fn from(m: MunicipalityDto) -> Self {
        Self {
            name: m.name,
            kind: m.kind,
            contact_email: m.contact_email,
        }
    }
}

impl From<PickupInfo> for PickupDto {
    fn from(p: PickupInfo) -> Self {
        Self {
            deadline: p.deadline_days,
            location: p.location,
            hours: p.hours,
            contact: p.contact,
        }
    }
}

impl From<PickupDto> for PickupInfo {
    fn from(p: PickupDto) -> Self {
        Self {
            deadline_days: p.deadline,
            location: p.location,
            hours: p.hours,
            contact: p.contact,
        }
    }
}

impl From<ItemDto> for ItemInput {
    fn from(i: ItemDto) -> Self {
        Self {
            name: i.name,
            category: i.category,
            date: i.date,
            location: i.location,
            status: Some(i.status),
            description: i.description,
        }
    }
}

impl From<CreateFoundItemReq> for NewFoundItem {
    fn from(req: CreateFoundItemReq) -> Self {
        Self {
            municipality: req.municipality.into(),
            item: req.item.into(),
            pickup: req.pickup.into(),
            categories: req.categories,
        }
    }
}

impl From<UpdateFoundItemReq> for FoundItemPatch {
    fn from(req: UpdateFoundItemReq) -> Self {
        Self {
            municipality: req.municipality.map(Into::into),
            item: req.item.map(Into::into),
            pickup: req.pickup.map(Into::into),
            categories: req.categories,
        }
    }
}

impl From<&ListFoundItemsQuery> for ListFilters {
    fn from(q: &ListFoundItemsQuery) -> Self {
        Self {
            category: q.category.clone(),
            municipality: q.municipality.clone(),
            status: q.status.clone(),
            search: q.search.clone(),
        }
    }
}

impl From<CategoryOption> for CategoryOptionDto {
    fn from(c: CategoryOption) -> Self {
        Self {
            value: c.value,
            label: c.label,
        }
    }
}

impl From<RegistryStats> for StatsDto {
    fn from(s: RegistryStats) -> Self {
        Self {
            found_items: StatusCountsDto {
                total: s.total,
                available: s.available,
                claimed: s.claimed,
            },
            top_categories: s
                .top_categories
                .into_iter()
                .map(|(category, count)| CategoryCountDto { category, count })
                .collect(),
            top_municipalities: s
                .top_municipalities
                .into_iter()
                .map(|(name, count)| MunicipalityCountDto { name, count })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::model::{ItemInfo, ItemStatus};
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn response_uses_camel_case_and_omits_empty_optionals() {
        let created = Utc.with_ymd_and_hms(2025, 4, 2, 8, 0, 0).unwrap();
        let dto = FoundItemDto::from(FoundItem {
            id: "id-1".into(),
            municipality: MunicipalityInfo {
                name: "Poznań".into(),
                kind: "city".into(),
                contact_email: "bzr@poznan.pl".into(),
            },
            item: ItemInfo {
                name: "Keys".into(),
                category: "keys".into(),
                date: "2025-04-01".into(),
                location: "Stary Rynek".into(),
                status: ItemStatus::Available,
                description: None,
            },
            pickup: PickupInfo {
                deadline_days: 14,
                location: "ul. Matejki 50".into(),
                hours: None,
                contact: None,
            },
            categories: vec![],
            created_at: created,
            updated_at: created,
        });

        let v = serde_json::to_value(dto).unwrap();
        assert_eq!(v["municipality"]["type"], "city");
        assert_eq!(v["municipality"]["contactEmail"], "bzr@poznan.pl");
        assert_eq!(v["pickup"]["deadline"], 14);
        assert_eq!(v["createdAt"], "2025-04-02T08:00:00Z");
        assert!(v["item"].get("description").is_none());
        assert!(v["pickup"].get("hours").is_none());
        assert_eq!(v["categories"], json!([]));
    }

    #[test]
    fn create_request_tolerates_missing_fields() {
        let req: CreateFoundItemReq = serde_json::from_value(json!({
            "municipality": { "name": "Łódź", "type": "city", "contactEmail": "a@lodz.pl" },
            "item": { "name": "Bag", "category": "bags", "date": "2025-01-01", "location": "Piotrkowska" },
            "pickup": { "deadline": 30, "location": "UMŁ" }
        }))
        .unwrap();

        let new_item = NewFoundItem::from(req);
        assert_eq!(new_item.item.status.as_deref(), Some(""));
        assert!(new_item.categories.is_empty());
        assert_eq!(new_item.municipality.contact_email, "a@lodz.pl");
    }

    #[test]
    fn stats_shape() {
        let v = serde_json::to_value(StatsDto::from(RegistryStats {
            total: 3,
            available: 2,
            claimed: 1,
            top_categories: vec![("keys".into(), 2)],
            top_municipalities: vec![("Kraków".into(), 3)],
        }))
        .unwrap();
        assert_eq!(v["foundItems"]["total"], 3);
        assert_eq!(v["topCategories"][0], json!({"category": "keys", "count": 2}));
        assert_eq!(v["topMunicipalities"][0], json!({"name": "Kraków", "count": 3}));
    }
}
