//! Persistence layer: connection pool, migrations, models and repositories
//! for the job store.

pub mod connection;
pub mod models;
pub mod repositories;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

pub use connection::{ConfigError, DbConfig};

pub type DbPool = sqlx::PgPool;

/// Default upper bound on pooled connections.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 20;

/// Create a connection pool from resolved connect options.
pub async fn connect(
    options: PgConnectOptions,
    max_connections: u32,
) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
}

/// Verify the database answers a trivial query.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply all pending job store migrations from `db/migrations`.
///
/// The broker migrator may share the database, so versions this migrator
/// does not know about are ignored.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    let mut migrator = sqlx::migrate!("../../db/migrations");
    migrator.set_ignore_missing(true);
    migrator.run(pool).await
}
