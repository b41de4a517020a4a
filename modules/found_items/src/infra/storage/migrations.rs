use sqlx::migrate::Migrator;

/// Schema for the `found_items` table, embedded at build time.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

pub async fn run(db: &db::DbHandle) -> Result<(), db::DbError> {
    MIGRATOR.run(db.sqlx_sqlite()).await?;
    Ok(())
}
