//! SQLite-specific helpers: DSN cleaning, typed PRAGMAs, path preparation.

pub(crate) mod dsn;
pub(crate) mod pragmas;

pub(crate) use dsn::{is_sqlite_dsn, prepare_sqlite_path, SqliteDsn};
