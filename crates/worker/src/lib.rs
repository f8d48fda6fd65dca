//! Worker runtime: pulls job messages from the broker, runs the matching
//! job definition, and records the outcome in the job store.

pub mod config;
pub mod error;
pub mod pool;
pub mod runtime;

pub use config::WorkerConfig;
pub use error::WorkerError;
pub use pool::WorkerPool;
pub use runtime::{Processed, Worker};
