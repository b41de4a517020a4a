use async_trait::async_trait;
use odata_core::{FilterClause, OrderSpec};

use crate::contract::model::{FoundItem, ListFilters, RegistryStats};

/// Raised by `insert` when the id is already taken; recoverable through
/// `anyhow::Error::downcast_ref`.
#[derive(Debug, thiserror::Error)]
#[error("duplicate found item id: {0}")]
pub struct DuplicateId(pub String);

/// Port for the domain layer: persistence operations the domain needs.
/// Object-safe and async-friendly via `async_trait`.
#[async_trait]
pub trait FoundItemsRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<FoundItem>>;
    /// Persist a fully-formed item; the service owns ids and timestamps.
    async fn insert(&self, item: FoundItem) -> anyhow::Result<()>;
    /// Overwrite the row with primary key `item.id`.
    async fn update(&self, item: FoundItem) -> anyhow::Result<()>;
    /// Returns true if a row was deleted.
    async fn delete(&self, id: &str) -> anyhow::Result<bool>;
    /// REST listing: newest first.
    async fn list(&self, filters: &ListFilters, skip: i64, limit: i64)
        -> anyhow::Result<Vec<FoundItem>>;
    /// Run an allow-listed filter and order.
    async fn query(
        &self,
        filter: FilterClause,
        order: &OrderSpec,
        skip: i64,
        top: i64,
    ) -> anyhow::Result<Vec<FoundItem>>;
    /// Rows matching `filter`, ignoring paging.
    async fn count(&self, filter: FilterClause) -> anyhow::Result<i64>;
    /// Distinct categories in ascending order.
    async fn categories(&self) -> anyhow::Result<Vec<String>>;
    async fn stats(&self) -> anyhow::Result<RegistryStats>;
}
