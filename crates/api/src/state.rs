use std::sync::Arc;

use jobrelay_queue::Dispatcher;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: the pools are reference counted internally.
#[derive(Clone)]
pub struct AppState {
    /// Job store connection pool.
    pub pool: jobrelay_db::DbPool,
    /// Validates and enqueues jobs.
    pub dispatcher: Dispatcher,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}
