//! Domain types shared by the jobrelay API server and worker.
//!
//! Nothing in here touches the database or the broker: it covers the job
//! type catalogue, request parameter validation, and the job definitions
//! the worker executes.

pub mod error;
pub mod job_input;
pub mod job_type;
pub mod jobs;
pub mod types;
