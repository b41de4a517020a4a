//! Parameterized `SELECT` composition and `SqlParam` binding.
//!
//! Only table/column names supplied by the caller (allow-listed upstream) and
//! SQL keywords are concatenated into the statement text; every value,
//! including `LIMIT` and `OFFSET`, travels as a bound argument.

use odata_core::{FilterClause, OrderSpec, SqlParam};
use sqlx::sqlite::SqliteArguments;
use sqlx::Arguments;

use crate::{DbError, Result};

/// Encode `params` in placeholder order.
pub fn to_arguments<'q>(params: &[SqlParam]) -> Result<SqliteArguments<'q>> {
    let mut args = SqliteArguments::default();
    for p in params {
        let res = match p {
            SqlParam::Text(s) => args.add(s.clone()),
            SqlParam::Integer(i) => args.add(*i),
            SqlParam::Bool(b) => args.add(*b),
            SqlParam::Null => args.add(Option::<String>::None),
        };
        res.map_err(|e| DbError::Bind(e.to_string()))?;
    }
    Ok(args)
}

/// Builder for `SELECT <columns> FROM <table> [WHERE ..] [ORDER BY ..] [LIMIT ? OFFSET ?]`.
#[derive(Clone, Debug)]
pub struct SelectQuery {
    table: String,
    columns: Vec<String>,
    filter: FilterClause,
    order: Vec<String>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl SelectQuery {
    pub fn new<I, S>(table: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            table: table.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            filter: FilterClause::new(),
            order: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// AND the given predicates onto any already present.
    pub fn filter(mut self, clause: FilterClause) -> Self {
        self.filter = self.filter.and(clause);
        self
    }

    pub fn order_by(mut self, spec: &OrderSpec) -> Self {
        self.order.push(spec.to_sql());
        self
    }

    pub fn limit(mut self, n: i64) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn offset(mut self, n: i64) -> Self {
        self.offset = Some(n);
        self
    }

    /// Statement text and its arguments in placeholder order.
    pub fn build(&self) -> (String, Vec<SqlParam>) {
        let mut sql = format!("SELECT {} FROM {}", self.columns.join(", "), self.table);
        let mut args = self.filter.args().to_vec();

        if let Some(w) = self.filter.to_sql() {
            sql.push_str(" WHERE ");
            sql.push_str(&w);
        }
        if !self.order.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order.join(", "));
        }
        match (self.limit, self.offset) {
            (Some(limit), offset) => {
                sql.push_str(" LIMIT ? OFFSET ?");
                args.push(SqlParam::Integer(limit));
                args.push(SqlParam::Integer(offset.unwrap_or(0)));
            }
            (None, Some(offset)) => {
                // SQLite only accepts OFFSET after LIMIT; -1 means unbounded
                sql.push_str(" LIMIT -1 OFFSET ?");
                args.push(SqlParam::Integer(offset));
            }
            (None, None) => {}
        }

        (sql, args)
    }

    /// `SELECT COUNT(*)` over the same table and WHERE clause, ignoring order and paging.
    pub fn build_count(&self) -> (String, Vec<SqlParam>) {
        let mut sql = format!("SELECT COUNT(*) FROM {}", self.table);
        if let Some(w) = self.filter.to_sql() {
            sql.push_str(" WHERE ");
            sql.push_str(&w);
        }
        (sql, self.filter.args().to_vec())
    }
}
