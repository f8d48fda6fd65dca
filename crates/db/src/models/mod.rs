//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` entity struct matching the database row
//! - The serializable view returned by the API
//! - Query DTOs for listing

pub mod job_record;
pub mod status;
