//! sqlx-backed repository implementation for the domain port.
//!
//! Every statement goes through `db::SelectQuery` or a fixed literal; values
//! always travel as bound `SqlParam`s.

use anyhow::Context;
use async_trait::async_trait;
use db::{to_arguments, DbHandle, SelectQuery};
use odata_core::{FilterClause, OrderSpec, SqlParam};
use sqlx::SqlitePool;

use crate::contract::model::{FoundItem, ListFilters, RegistryStats};
use crate::domain::repo::{DuplicateId, FoundItemsRepository};
use crate::infra::storage::fields::{COLUMNS, TABLE};
use crate::infra::storage::mapper::{
    categories_json, format_db_timestamp, row_to_contract, FoundItemRow,
};

const TOP_N: i64 = 10;

pub struct SqlxFoundItemsRepository {
    db: DbHandle,
}

impl SqlxFoundItemsRepository {
    pub fn new(db: DbHandle) -> Self {
        Self { db }
    }

    fn pool(&self) -> &SqlitePool {
        self.db.sqlx_sqlite()
    }

    async fn fetch_items(&self, q: &SelectQuery) -> anyhow::Result<Vec<FoundItem>> {
        let (sql, params) = q.build();
        let rows: Vec<FoundItemRow> = sqlx::query_as_with(&sql, to_arguments(&params)?)
            .fetch_all(self.pool())
            .await
            .context("select found items failed")?;
        Ok(rows.into_iter().map(row_to_contract).collect())
    }

    async fn scalar(&self, sql: &str, params: &[SqlParam]) -> anyhow::Result<i64> {
        sqlx::query_scalar_with(sql, to_arguments(params)?)
            .fetch_one(self.pool())
            .await
            .context("count found items failed")
    }

    async fn top_by(&self, column: &str) -> anyhow::Result<Vec<(String, i64)>> {
        let sql = format!(
            "SELECT {column}, COUNT(*) AS cnt FROM {TABLE} GROUP BY {column} ORDER BY cnt DESC, {column} ASC LIMIT ?"
        );
        sqlx::query_as_with(&sql, to_arguments(&[SqlParam::Integer(TOP_N)])?)
            .fetch_all(self.pool())
            .await
            .with_context(|| format!("top by {column} failed"))
    }
}

fn item_query() -> SelectQuery {
    SelectQuery::new(TABLE, COLUMNS)
}

/// WHERE clause of the REST listing: exact category/status, case-insensitive
/// substring on municipality, and `search` OR-ed across name/description/location.
pub(crate) fn list_clause(filters: &ListFilters) -> FilterClause {
    fn set(v: &Option<String>) -> Option<&str> {
        v.as_deref().filter(|s| !s.is_empty())
    }

    let mut clause = FilterClause::new();
    if let Some(category) = set(&filters.category) {
        clause.push("item_category = ?", [SqlParam::from(category)]);
    }
    if let Some(m) = set(&filters.municipality) {
        clause.push(
            "LOWER(municipality_name) LIKE LOWER(?)",
            [SqlParam::from(format!("%{m}%"))],
        );
    }
    if let Some(status) = set(&filters.status) {
        clause.push("item_status = ?", [SqlParam::from(status)]);
    }
    if let Some(search) = set(&filters.search) {
        let pattern = SqlParam::from(format!("%{search}%"));
        clause.push(
            "(LOWER(item_name) LIKE LOWER(?) OR LOWER(item_description) LIKE LOWER(?) OR LOWER(item_location) LIKE LOWER(?))",
            [pattern.clone(), pattern.clone(), pattern],
        );
    }
    clause
}

/// Values for every column except `id`, in `COLUMNS[1..]` order.
fn row_values(item: &FoundItem) -> anyhow::Result<Vec<SqlParam>> {
    Ok(vec![
        item.municipality.name.as_str().into(),
        item.municipality.kind.as_str().into(),
        item.municipality.contact_email.as_str().into(),
        item.item.name.as_str().into(),
        item.item.category.as_str().into(),
        item.item.date.as_str().into(),
        item.item.location.as_str().into(),
        item.item.status.as_str().into(),
        item.item.description.clone().into(),
        item.pickup.deadline_days.into(),
        item.pickup.location.as_str().into(),
        item.pickup.hours.clone().into(),
        item.pickup.contact.clone().into(),
        categories_json(&item.categories)?.into(),
        format_db_timestamp(item.created_at).into(),
        format_db_timestamp(item.updated_at).into(),
    ])
}

#[async_trait]
impl FoundItemsRepository for SqlxFoundItemsRepository {
    async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<FoundItem>> {
        let q = item_query().filter(FilterClause::new().with("id = ?", [SqlParam::from(id)]));
        let mut items = self.fetch_items(&q).await.context("find_by_id failed")?;
        Ok(items.pop())
    }

    async fn insert(&self, item: FoundItem) -> anyhow::Result<()> {
        let placeholders = vec!["?"; COLUMNS.len()].join(", ");
        let sql = format!(
            "INSERT INTO {TABLE} ({}) VALUES ({placeholders})",
            COLUMNS.join(", ")
        );
        let mut params = vec![SqlParam::from(item.id.as_str())];
        params.extend(row_values(&item)?);

        match sqlx::query_with(&sql, to_arguments(&params)?)
            .execute(self.pool())
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if db::errors::is_sqlx_unique_violation(&e) => {
                Err(DuplicateId(item.id).into())
            }
            Err(e) => Err(anyhow::Error::new(e).context("insert failed")),
        }
    }

    async fn update(&self, item: FoundItem) -> anyhow::Result<()> {
        let assignments = COLUMNS[1..]
            .iter()
            .filter(|c| **c != "created_at")
            .map(|c| format!("{c} = ?"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("UPDATE {TABLE} SET {assignments} WHERE id = ?");

        // created_at is immutable; drop its value (second to last).
        let mut params = row_values(&item)?;
        let created_idx = params.len() - 2;
        params.remove(created_idx);
        params.push(SqlParam::from(item.id.as_str()));

        sqlx::query_with(&sql, to_arguments(&params)?)
            .execute(self.pool())
            .await
            .context("update failed")?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> anyhow::Result<bool> {
        let res = sqlx::query_with(
            &format!("DELETE FROM {TABLE} WHERE id = ?"),
            to_arguments(&[SqlParam::from(id)])?,
        )
        .execute(self.pool())
        .await
        .context("delete failed")?;
        Ok(res.rows_affected() > 0)
    }

    async fn list(
        &self,
        filters: &ListFilters,
        skip: i64,
        limit: i64,
    ) -> anyhow::Result<Vec<FoundItem>> {
        let q = item_query()
            .filter(list_clause(filters))
            .order_by(&OrderSpec::default())
            .limit(limit)
            .offset(skip);
        self.fetch_items(&q).await.context("list failed")
    }

    async fn query(
        &self,
        filter: FilterClause,
        order: &OrderSpec,
        skip: i64,
        top: i64,
    ) -> anyhow::Result<Vec<FoundItem>> {
        let q = item_query()
            .filter(filter)
            .order_by(order)
            .limit(top)
            .offset(skip);
        self.fetch_items(&q).await
    }

    async fn count(&self, filter: FilterClause) -> anyhow::Result<i64> {
        let (sql, params) = item_query().filter(filter).build_count();
        self.scalar(&sql, &params).await
    }

    async fn categories(&self) -> anyhow::Result<Vec<String>> {
        sqlx::query_scalar(&format!(
            "SELECT DISTINCT item_category FROM {TABLE} ORDER BY item_category"
        ))
        .fetch_all(self.pool())
        .await
        .context("categories failed")
    }

    async fn stats(&self) -> anyhow::Result<RegistryStats> {
        let by_status = format!("SELECT COUNT(*) FROM {TABLE} WHERE item_status = ?");
        Ok(RegistryStats {
            total: self
                .scalar(&format!("SELECT COUNT(*) FROM {TABLE}"), &[])
                .await?,
            available: self.scalar(&by_status, &["available".into()]).await?,
            claimed: self.scalar(&by_status, &["claimed".into()]).await?,
            top_categories: self.top_by("item_category").await?,
            top_municipalities: self.top_by("municipality_name").await?,
        })
    }
}
