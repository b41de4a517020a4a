//! SQLite database access for the registry.
//!
//! Wraps a sqlx SQLite pool with DSN normalization and PRAGMA handling, plus
//! helpers for binding `odata_core::SqlParam` values and composing the
//! parameterized `SELECT` statements the storage layer runs.
//!
//! ```rust,no_run
//! # async fn demo() -> db::Result<()> {
//! use db::{ConnectOpts, DbHandle};
//!
//! let db = DbHandle::connect("sqlite::memory:", ConnectOpts::default()).await?;
//! let pool = db.sqlx_sqlite();
//! # let _ = pool;
//! db.close().await;
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod query;
mod sqlite;

pub use query::{to_arguments, SelectQuery};

use std::time::Duration;

use sqlx::sqlite::{SqliteConnection, SqlitePool, SqlitePoolOptions};
use thiserror::Error;

use crate::sqlite::{is_sqlite_dsn, prepare_sqlite_path, SqliteDsn};

pub type Result<T> = std::result::Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Unknown DSN: {0}")]
    UnknownDsn(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to bind query parameter: {0}")]
    Bind(String),
}

/// Pool knobs. Each maps onto the matching `SqlitePoolOptions` setter.
#[derive(Clone, Debug)]
pub struct ConnectOpts {
    pub max_conns: Option<u32>,
    pub min_conns: Option<u32>,
    pub acquire_timeout: Option<Duration>,
    pub idle_timeout: Option<Duration>,
    pub max_lifetime: Option<Duration>,
    pub test_before_acquire: bool,
    /// For file DSNs, create parent directories if missing.
    pub create_sqlite_dirs: bool,
    /// Used when the DSN carries no `busy_timeout`.
    pub busy_timeout_ms: u32,
}

impl Default for ConnectOpts {
    fn default() -> Self {
        Self {
            max_conns: Some(10),
            min_conns: None,
            acquire_timeout: Some(Duration::from_secs(30)),
            idle_timeout: None,
            max_lifetime: None,
            test_before_acquire: false,
            create_sqlite_dirs: true,
            busy_timeout_ms: DEFAULT_SQLITE_BUSY_TIMEOUT,
        }
    }
}

pub const DEFAULT_SQLITE_BUSY_TIMEOUT: u32 = 5000;

/// Main handle.
#[derive(Debug, Clone)]
pub struct DbHandle {
    pool: SqlitePool,
    dsn: String,
}

impl DbHandle {
    /// Connect and build handle.
    ///
    /// In-memory databases live inside a single connection, so their pool is
    /// pinned to exactly one connection that is never recycled.
    pub async fn connect(dsn: &str, opts: ConnectOpts) -> Result<Self> {
        if !is_sqlite_dsn(dsn) {
            return Err(DbError::UnknownDsn(dsn.to_string()));
        }
        prepare_sqlite_path(dsn, opts.create_sqlite_dirs)?;
        let parsed = SqliteDsn::parse(dsn.trim());

        let mut o = SqlitePoolOptions::new();
        if parsed.in_memory {
            o = o
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        } else {
            if let Some(n) = opts.max_conns {
                o = o.max_connections(n);
            }
            if let Some(n) = opts.min_conns {
                o = o.min_connections(n);
            }
            if let Some(t) = opts.idle_timeout {
                o = o.idle_timeout(t);
            }
            if let Some(t) = opts.max_lifetime {
                o = o.max_lifetime(t);
            }
        }
        if let Some(t) = opts.acquire_timeout {
            o = o.acquire_timeout(t);
        }
        if opts.test_before_acquire {
            o = o.test_before_acquire(true);
        }

        let pragmas = parsed.pragmas.clone();
        let in_memory = parsed.in_memory;
        let busy_default = opts.busy_timeout_ms;
        o = o.after_connect(move |conn, _meta| {
            let pragmas = pragmas.clone();
            Box::pin(async move {
                apply_pragmas(conn, &pragmas, in_memory, busy_default).await
            })
        });

        tracing::debug!(dsn = %parsed.clean, in_memory, "connecting to sqlite");
        let pool = o.connect(&parsed.clean).await?;

        Ok(Self {
            pool,
            dsn: parsed.clean,
        })
    }

    /// Graceful pool close.
    pub async fn close(self) {
        self.pool.close().await
    }

    /// DSN used for this connection, with PRAGMA keys stripped.
    pub fn dsn(&self) -> &str {
        &self.dsn
    }

    pub fn sqlx_sqlite(&self) -> &SqlitePool {
        &self.pool
    }
}

async fn apply_pragmas(
    conn: &mut SqliteConnection,
    pragmas: &sqlite::pragmas::Pragmas,
    in_memory: bool,
    busy_default: u32,
) -> std::result::Result<(), sqlx::Error> {
    // Values come from typed enums/integers only.
    let journal = pragmas.effective_journal_mode(in_memory);
    sqlx::query(&format!("PRAGMA journal_mode = {}", journal.as_sql()))
        .execute(&mut *conn)
        .await?;

    let sync = pragmas.effective_synchronous();
    sqlx::query(&format!("PRAGMA synchronous = {}", sync.as_sql()))
        .execute(&mut *conn)
        .await?;

    let fk = if pragmas.effective_foreign_keys() { "ON" } else { "OFF" };
    sqlx::query(&format!("PRAGMA foreign_keys = {fk}"))
        .execute(&mut *conn)
        .await?;

    if !in_memory {
        let busy = pragmas.busy_timeout_ms.unwrap_or(busy_default);
        sqlx::query(&format!("PRAGMA busy_timeout = {busy}"))
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}
