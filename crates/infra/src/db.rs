//! Database adapters (connection pool + schema bootstrap).

use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::store::StoreError;

/// Idempotent schema for the `users` and `books` tables.
pub const SCHEMA: &str = include_str!("../migrations/0001_init.sql");

/// Open a Postgres pool and make sure the schema exists.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, StoreError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .map_err(|e| StoreError::Backend(format!("failed to connect to postgres: {e}")))?;

    apply_schema(&pool).await?;
    Ok(pool)
}

pub async fn apply_schema(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .map_err(|e| StoreError::Backend(format!("failed to apply schema: {e}")))?;
    tracing::info!("database schema ensured");
    Ok(())
}
