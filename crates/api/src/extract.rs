//! Request body extractor for task submission.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use axum::Form;
use serde_json::{Map, Value};

use crate::error::AppError;
use crate::state::AppState;

/// Raw task parameters from a JSON object, a urlencoded form or a
/// `multipart/form-data` body.
///
/// Form values arrive as strings; typed validation happens in the
/// dispatcher, which accepts numeric strings for integer fields. An empty
/// body yields an empty map so missing fields are reported by validation.
#[derive(Debug, Clone, Default)]
pub struct TaskParams(pub Map<String, Value>);

impl FromRequest<AppState> for TaskParams {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_owned();

        if content_type.starts_with("multipart/form-data") {
            let mut multipart = Multipart::from_request(req, state).await?;
            let mut fields = Map::new();
            while let Some(field) = multipart.next_field().await? {
                // Unnamed parts cannot map to a parameter.
                let Some(name) = field.name().map(str::to_owned) else {
                    continue;
                };
                fields.insert(name, Value::String(field.text().await?));
            }
            return Ok(Self(fields));
        }

        if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(fields) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            return Ok(Self(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Value::String(v)))
                    .collect(),
            ));
        }

        let bytes = Bytes::from_request(req, state).await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(map)) => Ok(Self(map)),
            Ok(_) => Err(AppError::BadRequest(
                "Request body must be a JSON object".to_string(),
            )),
            Err(e) => Err(AppError::BadRequest(format!("Malformed JSON body: {e}"))),
        }
    }
}
