//! Signing endpoint
//!
//! One submission records one party's signature via exactly one of the
//! three methods. Artifact problems reject before anything is written;
//! the aggregate state is recomputed from the signature set after every
//! accepted write.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use splitmark_common::events::SplitmarkEvent;
use splitmark_common::participant::ParticipantCategory;
use splitmark_common::signature::{
    self, SignatureArtifact, SignatureMode, SignatureRecord, WorkflowState,
};
use tracing::info;
use uuid::Uuid;

use super::{signed_count, ApiError};
use crate::{db, AppState};

/// Uploaded signature image payload
#[derive(Debug, Deserialize)]
pub struct SignatureImage {
    pub content_type: String,
    pub data_base64: String,
}

/// Signing request
///
/// The party identifies itself either by the signer-link access token from
/// its notification, or by (party_category, party_reference). Exactly one
/// artifact field matching `signature_mode` must be present.
#[derive(Debug, Deserialize)]
pub struct SignRequest {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub party_category: Option<String>,
    #[serde(default)]
    pub party_reference: Option<u32>,
    /// Optional cross-check against the record's party name
    #[serde(default)]
    pub party_name: Option<String>,
    pub signature_mode: String,
    #[serde(default)]
    pub signature_image: Option<SignatureImage>,
    #[serde(default)]
    pub signature_drawing: Option<String>,
    #[serde(default)]
    pub signature_text: Option<String>,
}

/// Signing response
#[derive(Debug, Serialize)]
pub struct SignResponse {
    pub splitsheet_id: Uuid,
    pub entry_id: String,
    pub status: String,
    pub state: String,
    pub signed_count: usize,
    pub total_parties: usize,
    pub all_signed: bool,
}

/// POST /api/splitsheets/:id/sign
pub async fn sign_splitsheet(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SignRequest>,
) -> Result<Json<SignResponse>, ApiError> {
    let (row, sheet) = db::load_splitsheet(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Splitsheet {} not found", id)))?;

    if row.voided {
        return Err(ApiError::Conflict(format!(
            "Splitsheet {} is voided and can no longer be signed",
            id
        )));
    }

    let signatures = db::load_signatures(&state.db, id).await?;
    let party = resolve_party(&signatures, &request)?;

    let mode = SignatureMode::from_str(&request.signature_mode).ok_or_else(|| {
        ApiError::BadRequest(format!(
            "Unknown signature mode '{}', expected upload, draw or type",
            request.signature_mode
        ))
    })?;

    let artifact = build_artifact(mode, &request)?;
    artifact
        .validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let artifact_json = serde_json::to_string(&artifact)
        .map_err(|e| ApiError::Internal(format!("Artifact serialization failed: {}", e)))?;

    let recorded = db::record_signature(
        &state.db,
        id,
        party.category,
        party.reference_number,
        mode,
        &artifact_json,
    )
    .await?;
    if !recorded {
        return Err(ApiError::NotFound(format!(
            "No signature record for party {} on splitsheet {}",
            party.entry_id, id
        )));
    }

    // Derived transition: recompute the aggregate from the signature set
    // after every write, never from a stored flag
    let signatures = db::load_signatures(&state.db, id).await?;
    let workflow_state = signature::derive_state(&signatures, false);
    let signed = signed_count(&signatures);

    info!(
        "Signature recorded for {} on splitsheet {} ({}/{} signed)",
        party.entry_id,
        id,
        signed,
        signatures.len()
    );

    state
        .broadcaster
        .broadcast_lossy(SplitmarkEvent::SignatureRecorded {
            splitsheet_id: id,
            entry_id: party.entry_id.clone(),
            party_name: party.party_name.clone(),
            signed_count: signed,
            total_parties: signatures.len(),
            state: workflow_state,
            timestamp: chrono::Utc::now(),
        });

    if workflow_state == WorkflowState::FullySigned {
        db::insert_completion_notifications(&state.db, id, &sheet).await?;
        info!(
            "Splitsheet {} ({}) fully signed, access gate open",
            id, row.song_reference
        );
        state
            .broadcaster
            .broadcast_lossy(SplitmarkEvent::SplitsheetFullySigned {
                splitsheet_id: id,
                song_reference: row.song_reference.clone(),
                timestamp: chrono::Utc::now(),
            });
    }

    Ok(Json(SignResponse {
        splitsheet_id: id,
        entry_id: party.entry_id.clone(),
        status: "signed".to_string(),
        state: workflow_state.to_string(),
        signed_count: signed,
        total_parties: signatures.len(),
        all_signed: workflow_state == WorkflowState::FullySigned,
    }))
}

/// Resolve the signing party from the request: access token first, else
/// explicit (category, reference). The optional party name is cross-checked
/// when given.
fn resolve_party<'a>(
    signatures: &'a [SignatureRecord],
    request: &SignRequest,
) -> Result<&'a SignatureRecord, ApiError> {
    let record = if let Some(token) = &request.access_token {
        signatures
            .iter()
            .find(|s| s.access_token == *token)
            .ok_or_else(|| ApiError::NotFound("Invalid signer access token".to_string()))?
    } else {
        let category = request
            .party_category
            .as_deref()
            .and_then(ParticipantCategory::from_str)
            .ok_or_else(|| {
                ApiError::BadRequest(
                    "Identify the signing party with access_token or party_category and party_reference"
                        .to_string(),
                )
            })?;
        let reference = request.party_reference.ok_or_else(|| {
            ApiError::BadRequest("party_reference is required with party_category".to_string())
        })?;
        signatures
            .iter()
            .find(|s| s.category == category && s.reference_number == reference)
            .ok_or_else(|| {
                ApiError::NotFound(format!(
                    "No signing party {} #{} on this splitsheet",
                    category, reference
                ))
            })?
    };

    if let Some(name) = &request.party_name {
        if !name.trim().is_empty() && name.trim() != record.party_name {
            return Err(ApiError::BadRequest(format!(
                "Party name '{}' does not match the invited signer",
                name
            )));
        }
    }

    Ok(record)
}

/// Assemble the artifact for the selected mode, rejecting a submission
/// whose matching artifact field is absent.
fn build_artifact(mode: SignatureMode, request: &SignRequest) -> Result<SignatureArtifact, ApiError> {
    match mode {
        SignatureMode::Upload => request
            .signature_image
            .as_ref()
            .map(|image| SignatureArtifact::Upload {
                content_type: image.content_type.clone(),
                data_base64: image.data_base64.clone(),
            })
            .ok_or_else(|| {
                ApiError::BadRequest("Please upload a signature image".to_string())
            }),
        SignatureMode::Draw => request
            .signature_drawing
            .clone()
            .map(|data_url| SignatureArtifact::Draw { data_url })
            .ok_or_else(|| {
                ApiError::BadRequest("Please draw your signature before submitting".to_string())
            }),
        SignatureMode::Type => request
            .signature_text
            .clone()
            .map(|text| SignatureArtifact::Type { text })
            .ok_or_else(|| {
                ApiError::BadRequest(
                    "Please enter your full legal name for the typed signature".to_string(),
                )
            }),
    }
}
