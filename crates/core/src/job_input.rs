//! Typed, validated job parameters.
//!
//! Request bodies arrive either as JSON (numbers and strings) or as form
//! data (strings only), so every accessor accepts both shapes. The
//! validated [`JobInput`] is what gets snapshotted into `input_data` and
//! carried in the broker message.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::{Validate, ValidationErrors};

use crate::error::CoreError;
use crate::job_type::JobType;

/// Parameters for [`JobType::AddNumbers`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddNumbers {
    pub x: i64,
    pub y: i64,
}

/// Parameters for [`JobType::SendEmail`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct SendEmail {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, max = 255, message = "must be between 1 and 255 characters"))]
    pub subject: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub message: String,
}

/// Parameters for [`JobType::ProcessData`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ProcessData {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub data: String,
}

/// Validated parameters for one job, tagged by job type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobInput {
    AddNumbers(AddNumbers),
    SendEmail(SendEmail),
    ProcessData(ProcessData),
}

impl JobInput {
    /// Parse and validate raw request parameters for `job_type`.
    pub fn from_params(job_type: JobType, params: &Map<String, Value>) -> Result<Self, CoreError> {
        match job_type {
            JobType::AddNumbers => Ok(JobInput::AddNumbers(AddNumbers {
                x: required_integer(params, "x")?,
                y: required_integer(params, "y")?,
            })),
            JobType::SendEmail => {
                let input = SendEmail {
                    email: required_string(params, "email")?,
                    subject: required_string(params, "subject")?,
                    message: required_string(params, "message")?,
                };
                input.validate().map_err(validation_error)?;
                Ok(JobInput::SendEmail(input))
            }
            JobType::ProcessData => {
                let input = ProcessData {
                    data: required_string(params, "data")?,
                };
                input.validate().map_err(validation_error)?;
                Ok(JobInput::ProcessData(input))
            }
        }
    }

    /// Rebuild an input from a stored snapshot (`input_data` / message payload).
    pub fn from_snapshot(job_type: JobType, snapshot: &Value) -> Result<Self, CoreError> {
        let params = snapshot.as_object().ok_or_else(|| {
            CoreError::Validation("Job input snapshot must be a JSON object".to_string())
        })?;
        Self::from_params(job_type, params)
    }

    pub fn job_type(&self) -> JobType {
        match self {
            JobInput::AddNumbers(_) => JobType::AddNumbers,
            JobInput::SendEmail(_) => JobType::SendEmail,
            JobInput::ProcessData(_) => JobType::ProcessData,
        }
    }

    /// The flat key-value snapshot stored in `input_data`.
    pub fn to_value(&self) -> Value {
        match self {
            JobInput::AddNumbers(AddNumbers { x, y }) => serde_json::json!({ "x": x, "y": y }),
            JobInput::SendEmail(SendEmail {
                email,
                subject,
                message,
            }) => serde_json::json!({ "email": email, "subject": subject, "message": message }),
            JobInput::ProcessData(ProcessData { data }) => serde_json::json!({ "data": data }),
        }
    }

    /// Message returned to the caller when the job has been enqueued.
    pub fn started_message(&self) -> String {
        match self {
            JobInput::AddNumbers(AddNumbers { x, y }) => format!("Task started: Adding {x} + {y}"),
            JobInput::SendEmail(SendEmail { email, .. }) => {
                format!("Email task started for {email}")
            }
            JobInput::ProcessData(ProcessData { data }) => {
                format!("Processing task started for: {data}")
            }
        }
    }
}

fn required_integer(params: &Map<String, Value>, field: &str) -> Result<i64, CoreError> {
    match params.get(field) {
        None | Some(Value::Null) => Err(missing(field)),
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| CoreError::Validation(format!("{field} must be an integer, got {n}"))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| CoreError::Validation(format!("{field} must be an integer, got '{s}'"))),
        Some(other) => Err(CoreError::Validation(format!(
            "{field} must be an integer, got {other}"
        ))),
    }
}

fn required_string(params: &Map<String, Value>, field: &str) -> Result<String, CoreError> {
    match params.get(field) {
        None | Some(Value::Null) => Err(missing(field)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(CoreError::Validation(format!(
            "{field} must be a string, got {other}"
        ))),
    }
}

fn missing(field: &str) -> CoreError {
    CoreError::Validation(format!("Missing required field '{field}'"))
}

/// Flatten `validator` output into one sorted, readable message.
fn validation_error(errors: ValidationErrors) -> CoreError {
    let mut parts: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(msg) => format!("{field} {msg}"),
                None => format!("{field} is invalid ({})", e.code),
            })
        })
        .collect();
    parts.sort();
    CoreError::Validation(parts.join("; "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_add_numbers_accepts_json_integers() {
        let input = JobInput::from_params(JobType::AddNumbers, &params(json!({"x": 2, "y": 3})))
            .unwrap();
        assert_eq!(input, JobInput::AddNumbers(AddNumbers { x: 2, y: 3 }));
        assert_eq!(input.started_message(), "Task started: Adding 2 + 3");
    }

    #[test]
    fn test_add_numbers_accepts_form_strings() {
        let input =
            JobInput::from_params(JobType::AddNumbers, &params(json!({"x": " 7", "y": "-4"})))
                .unwrap();
        assert_eq!(input, JobInput::AddNumbers(AddNumbers { x: 7, y: -4 }));
    }

    #[test]
    fn test_add_numbers_rejects_non_integer() {
        let err = JobInput::from_params(JobType::AddNumbers, &params(json!({"x": "abc", "y": 1})))
            .unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.contains("x must be an integer"));

        let err = JobInput::from_params(JobType::AddNumbers, &params(json!({"x": 2.5, "y": 1})))
            .unwrap_err();
        assert_matches!(err, CoreError::Validation(_));
    }

    #[test]
    fn test_add_numbers_rejects_missing_field() {
        let err =
            JobInput::from_params(JobType::AddNumbers, &params(json!({"x": 1}))).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg == "Missing required field 'y'");
    }

    #[test]
    fn test_send_email_validates_address() {
        let err = JobInput::from_params(
            JobType::SendEmail,
            &params(json!({"email": "not-an-address", "subject": "Hi", "message": "Body"})),
        )
        .unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg == "email must be a valid email address");
    }

    #[test]
    fn test_send_email_subject_length_bound() {
        let email = |subject: String| {
            JobInput::from_params(
                JobType::SendEmail,
                &params(json!({"email": "a@example.com", "subject": subject, "message": "Body"})),
            )
        };

        assert!(email("s".repeat(255)).is_ok());
        let err = email("s".repeat(256)).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.starts_with("subject"));
    }

    #[test]
    fn test_send_email_message() {
        let input = JobInput::from_params(
            JobType::SendEmail,
            &params(json!({"email": "a@example.com", "subject": "Hi", "message": "Body"})),
        )
        .unwrap();
        assert_eq!(input.started_message(), "Email task started for a@example.com");
    }

    #[test]
    fn test_process_data_rejects_empty_and_non_string() {
        assert!(
            JobInput::from_params(JobType::ProcessData, &params(json!({"data": ""}))).is_err()
        );
        assert!(
            JobInput::from_params(JobType::ProcessData, &params(json!({"data": [1, 2]}))).is_err()
        );
    }

    #[test]
    fn test_snapshot_restores_input() {
        let input = JobInput::ProcessData(ProcessData {
            data: "Sample data".into(),
        });
        let restored = JobInput::from_snapshot(JobType::ProcessData, &input.to_value()).unwrap();
        assert_eq!(restored, input);
    }

    #[test]
    fn test_snapshot_must_be_object() {
        assert!(JobInput::from_snapshot(JobType::AddNumbers, &json!([1, 2])).is_err());
    }
}
