//! The catalogue of job types the system knows how to run.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A kind of background job. Stored as its snake_case name in
/// `job_records.job_type` and carried verbatim in broker messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    AddNumbers,
    SendEmail,
    ProcessData,
}

impl JobType {
    /// Every job type, in display order.
    pub const ALL: [JobType; 3] = [JobType::AddNumbers, JobType::SendEmail, JobType::ProcessData];

    /// The stored / wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            JobType::AddNumbers => "add_numbers",
            JobType::SendEmail => "send_email",
            JobType::ProcessData => "process_data",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Unknown job type '{s}'. Must be one of: {}",
                    JobType::ALL.map(JobType::as_str).join(", ")
                ))
            })
    }
}
