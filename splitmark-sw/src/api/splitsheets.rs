//! Splitsheet creation, reading, validation preview and voiding
//!
//! Creation is the submission boundary: a document either passes structural
//! validation completely and enters the signing workflow, or the caller gets
//! the full field-error list and nothing is persisted.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use splitmark_common::allocation::{self, AllocationAlert, CategoryTotals};
use splitmark_common::db::{get_setting, SETTING_DEFAULT_PUBLISHER, SETTING_SONG_REFERENCE_PATTERN};
use splitmark_common::events::SplitmarkEvent;
use splitmark_common::participant::{ContactInfo, Publisher};
use splitmark_common::signature;
use splitmark_common::splitsheet::Splitsheet;
use splitmark_common::validate::{validate_document, FieldError, ValidationPolicy};
use tracing::info;
use uuid::Uuid;

use super::{signed_count, ApiError, PartyStatus};
use crate::{db, AppState};

/// Response for successful splitsheet creation
#[derive(Debug, Serialize)]
pub struct CreateResponse {
    pub splitsheet_id: Uuid,
    pub song_reference: String,
    pub state: String,
    pub total_parties: usize,
    pub notifications_sent: usize,
    pub parties: Vec<PartyStatus>,
}

/// Full splitsheet view
#[derive(Debug, Serialize)]
pub struct SplitsheetResponse {
    pub splitsheet_id: Uuid,
    pub state: String,
    pub unlocked: bool,
    pub signed_count: usize,
    pub total_parties: usize,
    pub totals: CategoryTotals,
    pub alerts: Vec<AllocationAlert>,
    pub parties: Vec<PartyStatus>,
    pub document: Splitsheet,
}

/// Validation preview result (nothing is persisted)
#[derive(Debug, Serialize)]
pub struct ValidatePreviewResponse {
    pub valid: bool,
    pub field_errors: Vec<FieldError>,
    pub alerts: Vec<AllocationAlert>,
    pub totals: CategoryTotals,
}

/// POST /api/splitsheets
///
/// Submission boundary: validate the composed document and, if clean, enter
/// the signing workflow with one pending signature record per party.
pub async fn create_splitsheet(
    State(state): State<AppState>,
    Json(mut sheet): Json<Splitsheet>,
) -> Result<(StatusCode, Json<CreateResponse>), ApiError> {
    prepare_document(&state, &mut sheet).await?;

    let policy = load_policy(&state).await?;
    if let Err(errors) = validate_document(&sheet, &policy) {
        return Err(ApiError::Validation(errors));
    }

    // Identity is the song reference; a second submission is a conflict,
    // not a silent overwrite
    if db::reference_exists(&state.db, &sheet.song_reference).await? {
        return Err(ApiError::Conflict(format!(
            "A splitsheet for song reference '{}' already exists",
            sheet.song_reference
        )));
    }

    let (id, notifications_sent) = db::insert_splitsheet(&state.db, &sheet).await?;
    let signatures = db::load_signatures(&state.db, id).await?;

    info!(
        "Created splitsheet {} ({}) with {} signing parties",
        id,
        sheet.song_reference,
        signatures.len()
    );

    state
        .broadcaster
        .broadcast_lossy(SplitmarkEvent::SplitsheetCreated {
            splitsheet_id: id,
            song_reference: sheet.song_reference.clone(),
            total_parties: signatures.len(),
            timestamp: chrono::Utc::now(),
        });

    let response = CreateResponse {
        splitsheet_id: id,
        song_reference: sheet.song_reference.clone(),
        state: signature::derive_state(&signatures, false).to_string(),
        total_parties: signatures.len(),
        notifications_sent,
        parties: signatures.iter().map(PartyStatus::from).collect(),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/splitsheets/:id
pub async fn get_splitsheet(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SplitsheetResponse>, ApiError> {
    let (row, sheet) = db::load_splitsheet(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Splitsheet {} not found", id)))?;

    let signatures = db::load_signatures(&state.db, id).await?;
    let workflow_state = signature::derive_state(&signatures, row.voided);

    Ok(Json(SplitsheetResponse {
        splitsheet_id: id,
        state: workflow_state.to_string(),
        unlocked: signature::is_unlocked(workflow_state),
        signed_count: signed_count(&signatures),
        total_parties: signatures.len(),
        totals: allocation::category_totals(&sheet),
        alerts: allocation::validate_allocation(&sheet),
        parties: signatures.iter().map(PartyStatus::from).collect(),
        document: sheet,
    }))
}

/// POST /api/splitsheets/validate
///
/// Run the same validation the submission boundary applies, without
/// persisting anything. Used by composing clients for live feedback.
pub async fn validate_preview(
    State(state): State<AppState>,
    Json(mut sheet): Json<Splitsheet>,
) -> Result<Json<ValidatePreviewResponse>, ApiError> {
    prepare_document(&state, &mut sheet).await?;

    let policy = load_policy(&state).await?;
    let field_errors = match validate_document(&sheet, &policy) {
        Ok(()) => Vec::new(),
        Err(errors) => errors,
    };

    Ok(Json(ValidatePreviewResponse {
        valid: field_errors.is_empty(),
        alerts: allocation::validate_allocation(&sheet),
        totals: allocation::category_totals(&sheet),
        field_errors,
    }))
}

/// POST /api/splitsheets/:id/void
///
/// Administrative void: terminal state, refuses further signing and keeps
/// the access gate closed permanently.
pub async fn void_splitsheet(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (row, _) = db::load_splitsheet(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Splitsheet {} not found", id)))?;

    db::void_splitsheet(&state.db, id).await?;
    info!("Voided splitsheet {} ({})", id, row.song_reference);

    state
        .broadcaster
        .broadcast_lossy(SplitmarkEvent::SplitsheetVoided {
            splitsheet_id: id,
            song_reference: row.song_reference.clone(),
            timestamp: chrono::Utc::now(),
        });

    Ok(Json(serde_json::json!({
        "splitsheet_id": id,
        "state": signature::WorkflowState::Voided.as_str(),
    })))
}

/// Normalize a submitted document before validation: inject the house
/// publisher when the list was left empty, and classify legacy
/// other-contributor entries that lack an explicit contribution category.
async fn prepare_document(state: &AppState, sheet: &mut Splitsheet) -> Result<(), ApiError> {
    if sheet.publishers.is_empty() {
        let name = get_setting(&state.db, SETTING_DEFAULT_PUBLISHER, "SplitMark Publishing").await?;
        sheet.publishers.push(Publisher {
            contact: ContactInfo {
                reference_number: 1,
                name: name.clone(),
                address: format!("c/o {}", name),
                phone: None,
                email: None,
                pro_affiliation: None,
                national_id: None,
                date_of_birth: None,
                ipi_number: None,
            },
            publisher_name: name,
            publishing_percentage: 100,
        });
    }

    sheet.classify_legacy_contributors();
    Ok(())
}

async fn load_policy(state: &AppState) -> Result<ValidationPolicy, ApiError> {
    let pattern = get_setting(&state.db, SETTING_SONG_REFERENCE_PATTERN, "").await?;
    Ok(ValidationPolicy::from_pattern_setting(&pattern)?)
}
