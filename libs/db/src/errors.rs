//! Storage error classification helpers.

/// SQLite extended result codes for constraint violations on a key.
const SQLITE_CONSTRAINT_PRIMARYKEY: &str = "1555";
const SQLITE_CONSTRAINT_UNIQUE: &str = "2067";

/// True for a unique or primary-key constraint violation code.
pub fn is_unique_violation_code(code: &str) -> bool {
    matches!(code, SQLITE_CONSTRAINT_PRIMARYKEY | SQLITE_CONSTRAINT_UNIQUE)
}

pub fn is_sqlx_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db
            .code()
            .map(|c| is_unique_violation_code(c.as_ref()))
            .unwrap_or(false),
        _ => false,
    }
}
