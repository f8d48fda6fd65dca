//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async operations
//! that accept `&PgPool` as the first argument.

pub mod job_record_repo;

pub use job_record_repo::JobRecordRepo;
