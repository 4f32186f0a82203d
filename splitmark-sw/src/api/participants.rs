//! Participant list mutation
//!
//! Add/remove operations run under the per-splitsheet lock so the mutation
//! and the redistribution it triggers are one atomic unit. Once any party
//! has signed, the participant lists are frozen: percentage changes after
//! signing would invalidate consent already given.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use splitmark_common::allocation::{self, AllocationAlert, CategoryTotals};
use splitmark_common::participant::{Participant, ParticipantCategory};
use splitmark_common::signature::SignatureStatus;
use splitmark_common::splitsheet::Splitsheet;
use tracing::info;
use uuid::Uuid;

use super::ApiError;
use crate::{db, AppState};

/// Response after a participant mutation
#[derive(Debug, Serialize)]
pub struct ParticipantsResponse {
    pub splitsheet_id: Uuid,
    pub totals: CategoryTotals,
    pub alerts: Vec<AllocationAlert>,
    pub document: Splitsheet,
}

/// POST /api/splitsheets/:id/participants
///
/// Append a participant to its category list. Writer/composer and
/// recording-artist pools re-divide equally after the add.
pub async fn add_participant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(participant): Json<Participant>,
) -> Result<Json<ParticipantsResponse>, ApiError> {
    let _guard = state.locks.acquire(id).await;

    let mut sheet = load_mutable_sheet(&state, id).await?;
    let category = participant.category();

    sheet.push_participant(participant);
    redistribute_for(&mut sheet, category);

    db::store_document(&state.db, id, &sheet).await?;
    info!("Added {} to splitsheet {}", category, id);

    Ok(Json(mutation_response(id, sheet)))
}

/// DELETE /api/splitsheets/:id/participants/:category/:reference
///
/// Remove one participant, renumber the remainder and re-divide the pool.
/// The last entry of a required category cannot be removed.
pub async fn remove_participant(
    State(state): State<AppState>,
    Path((id, category, reference)): Path<(Uuid, String, u32)>,
) -> Result<Json<ParticipantsResponse>, ApiError> {
    let category = ParticipantCategory::from_str(&category)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown participant category '{}'", category)))?;

    let _guard = state.locks.acquire(id).await;

    let mut sheet = load_mutable_sheet(&state, id).await?;

    if category.is_required() && sheet.category_len(category) <= 1 {
        return Err(ApiError::Conflict(format!(
            "At least one {} is required, cannot remove the last entry",
            category.default_role().to_lowercase()
        )));
    }

    if !sheet.remove_participant(category, reference) {
        return Err(ApiError::NotFound(format!(
            "No {} with reference number {} on splitsheet {}",
            category, reference, id
        )));
    }
    redistribute_for(&mut sheet, category);

    db::store_document(&state.db, id, &sheet).await?;
    info!(
        "Removed {} #{} from splitsheet {}",
        category, reference, id
    );

    Ok(Json(mutation_response(id, sheet)))
}

/// Load a sheet for mutation, enforcing the void and post-signing guards
async fn load_mutable_sheet(state: &AppState, id: Uuid) -> Result<Splitsheet, ApiError> {
    let (row, sheet) = db::load_splitsheet(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Splitsheet {} not found", id)))?;

    if row.voided {
        return Err(ApiError::Conflict(format!(
            "Splitsheet {} is voided and cannot be edited",
            id
        )));
    }

    let signatures = db::load_signatures(&state.db, id).await?;
    if signatures
        .iter()
        .any(|s| s.status == SignatureStatus::Signed)
    {
        return Err(ApiError::Conflict(
            "Participants cannot change after a signature has been recorded".to_string(),
        ));
    }

    Ok(sheet)
}

fn redistribute_for(sheet: &mut Splitsheet, category: ParticipantCategory) {
    match category {
        ParticipantCategory::WriterComposer => allocation::redistribute_writers(sheet),
        ParticipantCategory::RecordingArtist => allocation::redistribute_recording_artists(sheet),
        _ => {}
    }
}

fn mutation_response(id: Uuid, sheet: Splitsheet) -> ParticipantsResponse {
    ParticipantsResponse {
        splitsheet_id: id,
        totals: allocation::category_totals(&sheet),
        alerts: allocation::validate_allocation(&sheet),
        document: sheet,
    }
}
