//! Postgres pool and schema.
//!
//! The `todo`, `users` and `sessions` tables live in `migrations/`, embedded
//! into the binary and applied on every start before the router is built.

use std::time::Duration;

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

static MIGRATOR: Migrator = sqlx::migrate!("src/db/migrations");

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Connect with at most `max_connections` and bring the schema up to date.
///
/// # Errors
///
/// Returns an error if Postgres is unreachable or a migration fails.
pub async fn init_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(database_url)
        .await?;

    MIGRATOR.run(&pool).await?;
    tracing::debug!(migrations = MIGRATOR.iter().count(), "schema up to date");

    Ok(pool)
}
