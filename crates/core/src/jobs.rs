//! Job definitions and the registry the worker dispatches through.
//!
//! Each definition is a fixed simulated delay followed by a deterministic
//! transform of its input. The registry is an explicit table keyed by
//! [`JobType`], built once at worker startup.

use std::collections::HashMap;
use std::time::Duration;

use crate::job_input::{AddNumbers, JobInput, ProcessData, SendEmail};
use crate::job_type::JobType;

/// Simulated work for `add_numbers`.
pub const ADD_NUMBERS_DELAY: Duration = Duration::from_secs(5);

/// Simulated work for `send_email`.
pub const SEND_EMAIL_DELAY: Duration = Duration::from_secs(3);

/// Simulated work for `process_data`.
pub const PROCESS_DATA_DELAY: Duration = Duration::from_secs(2);

/// Every simulated delay in the standard registry.
pub const SIMULATED_DELAYS: [Duration; 3] =
    [ADD_NUMBERS_DELAY, SEND_EMAIL_DELAY, PROCESS_DATA_DELAY];

/// `base` multiplied by `scale`, or `None` when the product is negative,
/// NaN or too large for a `Duration`.
pub fn scale_delay(base: Duration, scale: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(base.as_secs_f64() * scale).ok()
}

/// An error raised while executing a job body.
///
/// The display text is what gets persisted in `job_records.error`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JobError {
    #[error("Job input is invalid: {0}")]
    InvalidInput(String),

    #[error("Definition for {expected} received {actual} input")]
    InputMismatch { expected: JobType, actual: JobType },

    #[error("No job definition registered for {0}")]
    NotRegistered(JobType),
}

/// Signature of a job body: input in, result text out.
pub type JobFn = fn(&JobInput) -> Result<String, JobError>;

/// One entry in the registry.
#[derive(Debug, Clone, Copy)]
pub struct JobDefinition {
    pub job_type: JobType,
    pub simulated_work: Duration,
    pub run: JobFn,
}

/// Static mapping from [`JobType`] to its [`JobDefinition`].
#[derive(Debug, Clone)]
pub struct JobRegistry {
    definitions: HashMap<JobType, JobDefinition>,
}

impl JobRegistry {
    /// The standard registry with the full simulated delays.
    pub fn standard() -> Self {
        Self::with_delay_scale(1.0)
    }

    /// The standard registry with every delay multiplied by `scale`.
    ///
    /// A non-finite or non-positive scale disables the delays entirely. A
    /// product too large for a `Duration` saturates at `Duration::MAX`.
    pub fn with_delay_scale(scale: f64) -> Self {
        let scale = if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            0.0
        };
        let scaled = |base| scale_delay(base, scale).unwrap_or(Duration::MAX);

        let definitions = [
            JobDefinition {
                job_type: JobType::AddNumbers,
                simulated_work: scaled(ADD_NUMBERS_DELAY),
                run: add_numbers,
            },
            JobDefinition {
                job_type: JobType::SendEmail,
                simulated_work: scaled(SEND_EMAIL_DELAY),
                run: send_email,
            },
            JobDefinition {
                job_type: JobType::ProcessData,
                simulated_work: scaled(PROCESS_DATA_DELAY),
                run: process_data,
            },
        ]
        .into_iter()
        .map(|d| (d.job_type, d))
        .collect();

        Self { definitions }
    }

    /// Look up the definition for `job_type`.
    pub fn get(&self, job_type: JobType) -> Result<&JobDefinition, JobError> {
        self.definitions
            .get(&job_type)
            .ok_or(JobError::NotRegistered(job_type))
    }

    /// Run the job body for `input`, including its simulated delay.
    pub async fn execute(&self, input: &JobInput) -> Result<String, JobError> {
        let definition = self.get(input.job_type())?;

        if !definition.simulated_work.is_zero() {
            tokio::time::sleep(definition.simulated_work).await;
        }

        (definition.run)(input)
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

fn add_numbers(input: &JobInput) -> Result<String, JobError> {
    let JobInput::AddNumbers(AddNumbers { x, y }) = input else {
        return Err(mismatch(JobType::AddNumbers, input));
    };
    let (x, y) = (*x, *y);
    // Widened so every pair of i64 inputs has an exact sum.
    let result = i128::from(x) + i128::from(y);
    tracing::info!(x, y, result, "Task completed: {x} + {y} = {result}");
    Ok(result.to_string())
}

fn send_email(input: &JobInput) -> Result<String, JobError> {
    let JobInput::SendEmail(SendEmail { email, subject, .. }) = input else {
        return Err(mismatch(JobType::SendEmail, input));
    };
    tracing::info!(%email, %subject, "Email sent");
    Ok(format!("Email sent to {email}"))
}

fn process_data(input: &JobInput) -> Result<String, JobError> {
    let JobInput::ProcessData(ProcessData { data }) = input else {
        return Err(mismatch(JobType::ProcessData, input));
    };
    let processed = format!("Processed: {data}");
    tracing::info!(%processed, "Data processed");
    Ok(processed)
}

fn mismatch(expected: JobType, input: &JobInput) -> JobError {
    JobError::InputMismatch {
        expected,
        actual: input.job_type(),
    }
}
