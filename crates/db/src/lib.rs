//! Postgres storage layer: connection pool helpers, row models, and
//! repositories.
//!
//! Repositories are stateless structs whose methods take a
//! `&mut PgConnection`, so a caller can run a sequence of repository
//! calls inside one transaction and have the whole sequence commit or
//! roll back together. The edit workflow depends on that: applying an
//! edit touches the edit row, the target entity, and several relation
//! tables in a single atomic step.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub mod models;
pub mod repositories;

pub type DbPool = PgPool;

/// Create a connection pool against the given database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}

/// Verify the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply any pending migrations.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}
