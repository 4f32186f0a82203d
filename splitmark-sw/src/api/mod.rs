//! HTTP API for the splitsheet workflow service

mod access;
mod health;
mod participants;
mod sign;
mod splitsheets;
mod sse;

pub use access::{get_access, get_access_by_reference};
pub use health::{health_check, health_routes};
pub use participants::{add_participant, remove_participant};
pub use sign::sign_splitsheet;
pub use splitsheets::{create_splitsheet, get_splitsheet, validate_preview, void_splitsheet};
pub use sse::event_stream;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use splitmark_common::signature::{SignatureRecord, SignatureStatus};
use splitmark_common::validate::FieldError;

/// API error responses
#[derive(Debug)]
pub enum ApiError {
    /// Structural validation failed; carries the complete field error list
    Validation(Vec<FieldError>),
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "validation_failed",
                    "message": "Splitsheet validation failed",
                    "field_errors": errors,
                }),
            ),
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, json!({ "error": message }))
            }
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, json!({ "error": message })),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, json!({ "error": message })),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": message }))
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<splitmark_common::Error> for ApiError {
    fn from(e: splitmark_common::Error) -> Self {
        use splitmark_common::Error;
        match e {
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::Conflict(msg) => ApiError::Conflict(msg),
            // Persistence failures are retryable from the caller's side;
            // nothing was partially applied
            other => ApiError::Internal(other.to_string()),
        }
    }
}

/// Per-party signing status as exposed by the API (tokens stay internal)
#[derive(Debug, serde::Serialize)]
pub struct PartyStatus {
    pub entry_id: String,
    pub category: String,
    pub reference_number: u32,
    pub name: String,
    pub role: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signed_at: Option<String>,
}

impl From<&SignatureRecord> for PartyStatus {
    fn from(record: &SignatureRecord) -> Self {
        PartyStatus {
            entry_id: record.entry_id.clone(),
            category: record.category.as_str().to_string(),
            reference_number: record.reference_number,
            name: record.party_name.clone(),
            role: record.party_role.clone(),
            status: record.status.as_str().to_string(),
            mode: record.mode.map(|m| m.as_str().to_string()),
            signed_at: record.signed_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Count signed records in a signature set
pub(crate) fn signed_count(records: &[SignatureRecord]) -> usize {
    records
        .iter()
        .filter(|r| r.status == SignatureStatus::Signed)
        .count()
}
