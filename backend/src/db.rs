use std::str::FromStr;

use tower_sessions_sqlx_store::SqliteStore;

use crate::config::DatabaseConfig;

pub use sqlx::sqlite::{SqlitePool as DbPool, SqlitePoolOptions as DbPoolOptions};
use sqlx::sqlite::SqliteConnectOptions;

/// Opens the SQLite pool, creating the database file when it does not exist yet.
pub async fn connect(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    let connect_options = SqliteConnectOptions::from_str(&config.url)?
        .create_if_missing(true)
        .foreign_keys(true);

    DbPoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(connect_options)
        .await
}

/// Creates the `user` and `location` tables and the session table.
pub async fn migrate(pool: &DbPool) -> Result<(), sqlx::Error> {
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(pool).await?;
    SqliteStore::new(pool.clone()).migrate().await?;
    tracing::info!("Migrations complete.");
    Ok(())
}
