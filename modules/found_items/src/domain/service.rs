use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use odata_core::{parse_filter, parse_orderby, ODataPaging, PageLimits, QueryAllowLists, RestPaging};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::contract::model::{
    CategoryOption, FoundItem, FoundItemPatch, ItemInfo, ItemInput, ItemStatus, ListFilters,
    MunicipalityInfo, NewFoundItem, PickupInfo, QueryPage, RegistryStats,
};
use crate::domain::error::DomainError;
use crate::domain::repo::{DuplicateId, FoundItemsRepository};

/// Domain service with the registry's business rules.
/// Depends only on the repository port, not on infra types.
#[derive(Clone)]
pub struct Service {
    repo: Arc<dyn FoundItemsRepository>,
    fields: Arc<QueryAllowLists>,
    config: ServiceConfig,
}

/// Configuration for the domain service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub default_page_size: i64,
    pub max_page_size: i64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            default_page_size: odata_core::paging::DEFAULT_PAGE_SIZE,
            max_page_size: odata_core::paging::MAX_PAGE_SIZE,
        }
    }
}

impl ServiceConfig {
    pub fn page_limits(&self) -> PageLimits {
        PageLimits::new(self.default_page_size, self.max_page_size)
    }
}

impl Service {
    pub fn new(
        repo: Arc<dyn FoundItemsRepository>,
        fields: QueryAllowLists,
        config: ServiceConfig,
    ) -> Self {
        Self {
            repo,
            fields: Arc::new(fields),
            config,
        }
    }

    pub fn page_limits(&self) -> PageLimits {
        self.config.page_limits()
    }

    #[instrument(name = "found_items.service.get_item", skip(self))]
    pub async fn get_item(&self, id: &str) -> Result<FoundItem, DomainError> {
        debug!("Getting found item by id");

        self.repo
            .find_by_id(id)
            .await
            .map_err(DomainError::store)?
            .ok_or_else(|| DomainError::item_not_found(id))
    }

    #[instrument(name = "found_items.service.list_items", skip(self))]
    pub async fn list_items(
        &self,
        filters: ListFilters,
        paging: RestPaging,
    ) -> Result<Vec<FoundItem>, DomainError> {
        let items = self
            .repo
            .list(&filters, paging.skip, paging.limit)
            .await
            .map_err(DomainError::store)?;

        debug!("Listed {} found items", items.len());
        Ok(items)
    }

    /// Translate `$filter` / `$orderby` against the allow-lists and run them.
    /// A rejected filter never reaches the store.
    #[instrument(name = "found_items.service.query_items", skip(self))]
    pub async fn query_items(
        &self,
        filter: &str,
        orderby: &str,
        paging: ODataPaging,
    ) -> Result<QueryPage, DomainError> {
        let clause = parse_filter(filter, &self.fields.filter)?;
        let order = parse_orderby(orderby, &self.fields.order);
        debug!(where_clause = ?clause.to_sql(), order = %order, "translated OData query");

        let count = if paging.count {
            Some(
                self.repo
                    .count(clause.clone())
                    .await
                    .map_err(DomainError::store)?,
            )
        } else {
            None
        };

        let items = self
            .repo
            .query(clause, &order, paging.skip, paging.top)
            .await
            .map_err(DomainError::store)?;

        Ok(QueryPage { items, count })
    }

    #[instrument(
        name = "found_items.service.create_item",
        skip(self, new_item),
        fields(municipality = %new_item.municipality.name, item = %new_item.item.name)
    )]
    pub async fn create_item(&self, new_item: NewFoundItem) -> Result<FoundItem, DomainError> {
        info!("Registering found item");

        validate_municipality(&new_item.municipality)?;
        let item = build_item_info(new_item.item, None)?;
        let pickup = normalize_pickup(new_item.pickup)?;

        let now = now();
        let found = FoundItem {
            id: Uuid::new_v4().to_string(),
            municipality: new_item.municipality,
            item,
            pickup,
            categories: new_item.categories,
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = self.repo.insert(found.clone()).await {
            if let Some(DuplicateId(id)) = e.downcast_ref::<DuplicateId>() {
                return Err(DomainError::item_already_exists(id.clone()));
            }
            return Err(DomainError::store(e));
        }

        info!("Successfully registered found item with id={}", found.id);
        Ok(found)
    }

    #[instrument(name = "found_items.service.update_item", skip(self, patch))]
    pub async fn update_item(
        &self,
        id: &str,
        patch: FoundItemPatch,
    ) -> Result<FoundItem, DomainError> {
        info!("Updating found item");

        let mut current = self.get_item(id).await?;
        if patch.is_empty() {
            debug!("Empty patch, nothing to update");
            return Ok(current);
        }

        if let Some(municipality) = patch.municipality {
            validate_municipality(&municipality)?;
            current.municipality = municipality;
        }
        if let Some(item) = patch.item {
            current.item = build_item_info(item, Some(current.item.status.clone()))?;
        }
        if let Some(pickup) = patch.pickup {
            current.pickup = normalize_pickup(pickup)?;
        }
        if let Some(categories) = patch.categories {
            current.categories = categories;
        }
        current.updated_at = now().max(current.created_at);

        self.repo
            .update(current.clone())
            .await
            .map_err(DomainError::store)?;

        info!("Successfully updated found item");
        Ok(current)
    }

    #[instrument(name = "found_items.service.delete_item", skip(self))]
    pub async fn delete_item(&self, id: &str) -> Result<(), DomainError> {
        info!("Deleting found item");

        let deleted = self
            .repo
            .delete(id)
            .await
            .map_err(DomainError::store)?;

        if !deleted {
            return Err(DomainError::item_not_found(id));
        }
        Ok(())
    }

    #[instrument(name = "found_items.service.categories", skip(self))]
    pub async fn categories(&self) -> Result<Vec<CategoryOption>, DomainError> {
        let values = self
            .repo
            .categories()
            .await
            .map_err(DomainError::store)?;

        Ok(values
            .into_iter()
            .map(|value| CategoryOption {
                label: capitalize(&value),
                value,
            })
            .collect())
    }

    #[instrument(name = "found_items.service.stats", skip(self))]
    pub async fn stats(&self) -> Result<RegistryStats, DomainError> {
        self.repo
            .stats()
            .await
            .map_err(DomainError::store)
    }
}

/// Stored timestamps carry whole seconds.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn require(field: &str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(field, "must not be empty"));
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn validate_municipality(m: &MunicipalityInfo) -> Result<(), DomainError> {
    require("municipality.name", &m.name)?;
    require("municipality.type", &m.kind)?;

    let email = m.contact_email.trim();
    let looks_like_address = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !looks_like_address {
        return Err(DomainError::validation(
            "municipality.contactEmail",
            format!("'{}' is not a valid email address", m.contact_email),
        ));
    }
    Ok(())
}

/// Blank status keeps `fallback` (the stored status on update) or becomes `available`.
fn build_item_info(input: ItemInput, fallback: Option<ItemStatus>) -> Result<ItemInfo, DomainError> {
    require("item.name", &input.name)?;
    require("item.category", &input.category)?;
    require("item.date", &input.date)?;
    require("item.location", &input.location)?;

    let status = match non_blank(input.status) {
        Some(raw) => raw.trim().parse::<ItemStatus>().map_err(|e| {
            warn!(status = %raw, "rejected item status");
            DomainError::validation(
                "item.status",
                format!("{e}; expected one of available, claimed, expired"),
            )
        })?,
        None => fallback.unwrap_or_default(),
    };

    Ok(ItemInfo {
        name: input.name,
        category: input.category,
        date: input.date,
        location: input.location,
        status,
        description: non_blank(input.description),
    })
}

fn normalize_pickup(p: PickupInfo) -> Result<PickupInfo, DomainError> {
    require("pickup.location", &p.location)?;
    if p.deadline_days < 0 {
        return Err(DomainError::validation(
            "pickup.deadline",
            "must be zero or a positive number of days",
        ));
    }
    Ok(PickupInfo {
        hours: non_blank(p.hours),
        contact: non_blank(p.contact),
        ..p
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item_input(status: Option<&str>) -> ItemInput {
        ItemInput {
            name: "Wallet".into(),
            category: "wallets".into(),
            date: "2025-03-01".into(),
            location: "Tram 4".into(),
            status: status.map(Into::into),
            description: Some("  ".into()),
        }
    }

    #[test]
    fn status_defaults_and_parses() {
        assert_eq!(
            build_item_info(item_input(None), None).unwrap().status,
            ItemStatus::Available
        );
        assert_eq!(
            build_item_info(item_input(Some("")), Some(ItemStatus::Claimed))
                .unwrap()
                .status,
            ItemStatus::Claimed
        );
        assert_eq!(
            build_item_info(item_input(Some("expired")), None)
                .unwrap()
                .status,
            ItemStatus::Expired
        );
    }

    #[test]
    fn unknown_status_is_a_validation_error() {
        let err = build_item_info(item_input(Some("lost")), None).unwrap_err();
        assert!(matches!(err, DomainError::Validation { ref field, .. } if field == "item.status"));
    }

    #[test]
    fn blank_optionals_become_none() {
        let info = build_item_info(item_input(None), None).unwrap();
        assert_eq!(info.description, None);

        let pickup = normalize_pickup(PickupInfo {
            deadline_days: 30,
            location: "Town hall, room 12".into(),
            hours: Some(String::new()),
            contact: Some("+48 22 000 00 00".into()),
        })
        .unwrap();
        assert_eq!(pickup.hours, None);
        assert_eq!(pickup.contact.as_deref(), Some("+48 22 000 00 00"));
    }

    #[test]
    fn negative_deadline_is_rejected() {
        let err = normalize_pickup(PickupInfo {
            deadline_days: -1,
            location: "x".into(),
            ..Default::default()
        })
        .unwrap_err();
        assert!(err.to_string().contains("pickup.deadline"));
    }

    #[test]
    fn municipality_checks() {
        let mut m = MunicipalityInfo {
            name: "Gdańsk".into(),
            kind: "city".into(),
            contact_email: "biuro@gdansk.gov.pl".into(),
        };
        assert!(validate_municipality(&m).is_ok());

        m.contact_email = "not-an-email".into();
        assert!(validate_municipality(&m).is_err());

        m.contact_email = "@gdansk.gov.pl".into();
        assert!(validate_municipality(&m).is_err());

        m.contact_email = "biuro@gdansk.gov.pl".into();
        m.kind = " ".into();
        let err = validate_municipality(&m).unwrap_err();
        assert!(err.to_string().contains("municipality.type"));
    }

    #[test]
    fn labels_are_capitalized() {
        assert_eq!(capitalize("electronics"), "Electronics");
        assert_eq!(capitalize("łódki"), "Łódki");
        assert_eq!(capitalize(""), "");
    }
}
