//! Broker and dispatcher.
//!
//! The broker is a PostgreSQL-backed queue (`job_queue`) with
//! claim-with-visibility-timeout semantics; the dispatcher validates job
//! parameters, creates the pending job record and publishes the message.

pub mod broker;
pub mod config;
pub mod dispatcher;
pub mod error;

pub use broker::{PgBroker, QueuedMessage};
pub use config::BrokerConfig;
pub use dispatcher::{Dispatched, Dispatcher};
pub use error::QueueError;

/// Apply pending broker migrations from `db/queue_migrations`.
///
/// Runs against either the job store database or a dedicated broker
/// database; job store versions already applied there are ignored.
pub async fn run_migrations(pool: &sqlx::PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    let mut migrator = sqlx::migrate!("../../db/queue_migrations");
    migrator.set_ignore_missing(true);
    migrator.run(pool).await
}
