//! Access-gate projection endpoints
//!
//! Read-only derived permission for downstream consumers (e.g. a DJ-facing
//! catalog deciding whether to serve mixable stems). The unlock decision is
//! recomputed from the signature set on every query; it is never served
//! from stored state.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use splitmark_common::db::models::SplitsheetRow;
use splitmark_common::signature::{self, SignatureRecord};
use uuid::Uuid;

use super::{signed_count, ApiError};
use crate::{db, AppState};

/// Access-gate response
#[derive(Debug, Serialize)]
pub struct AccessResponse {
    pub unlocked: bool,
    pub state: String,
    pub song_title: String,
    pub song_reference: String,
    pub signed_count: usize,
    pub total_parties: usize,
}

/// GET /api/splitsheets/:id/access
pub async fn get_access(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AccessResponse>, ApiError> {
    let (row, _) = db::load_splitsheet(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Splitsheet {} not found", id)))?;

    let signatures = db::load_signatures(&state.db, id).await?;
    Ok(Json(access_response(&row, &signatures)))
}

/// GET /api/access/by-reference/:song_reference
///
/// Same projection keyed by the song's business identity, for catalog
/// systems that never see internal splitsheet ids.
pub async fn get_access_by_reference(
    State(state): State<AppState>,
    Path(song_reference): Path<String>,
) -> Result<Json<AccessResponse>, ApiError> {
    let (row, _) = db::load_splitsheet_by_reference(&state.db, &song_reference)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!(
                "No splitsheet for song reference '{}'",
                song_reference
            ))
        })?;

    let id = Uuid::parse_str(&row.guid)
        .map_err(|e| ApiError::Internal(format!("Bad stored guid: {}", e)))?;
    let signatures = db::load_signatures(&state.db, id).await?;
    Ok(Json(access_response(&row, &signatures)))
}

fn access_response(row: &SplitsheetRow, signatures: &[SignatureRecord]) -> AccessResponse {
    let workflow_state = signature::derive_state(signatures, row.voided);
    AccessResponse {
        unlocked: signature::is_unlocked(workflow_state),
        state: workflow_state.to_string(),
        song_title: row.song_title.clone(),
        song_reference: row.song_reference.clone(),
        signed_count: signed_count(signatures),
        total_parties: signatures.len(),
    }
}
