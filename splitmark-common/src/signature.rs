//! Signature workflow
//!
//! Per-party signature records, artifact validation for the three signing
//! methods, and the derived workflow state that gates downstream access.
//!
//! The aggregate state is always recomputed from the signature record set;
//! nothing here stores a "fully signed" flag as independent truth.

use crate::participant::ParticipantCategory;
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// How a party produced their signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureMode {
    Upload,
    Draw,
    Type,
}

impl SignatureMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureMode::Upload => "upload",
            SignatureMode::Draw => "draw",
            SignatureMode::Type => "type",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "upload" => Some(SignatureMode::Upload),
            "draw" => Some(SignatureMode::Draw),
            "type" => Some(SignatureMode::Type),
            _ => None,
        }
    }
}

impl std::fmt::Display for SignatureMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The signature evidence a party submitted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum SignatureArtifact {
    /// Uploaded image file (base64 body plus its content type)
    Upload {
        content_type: String,
        data_base64: String,
    },
    /// Canvas raster serialized as a `data:image/...;base64,` URL
    Draw { data_url: String },
    /// Typed legal name rendered as text
    Type { text: String },
}

/// Artifact rejection reasons, all recoverable client side
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArtifactError {
    #[error("Signature file must be an image, got '{0}'")]
    NotAnImage(String),
    #[error("Signature image is empty")]
    EmptyImage,
    #[error("Drawn signature is empty, draw your signature before submitting")]
    EmptyDrawing,
    #[error("Drawn signature is not a valid image data URL")]
    MalformedDataUrl,
    #[error("Typed signature requires your full legal name")]
    EmptyTypedName,
}

impl SignatureArtifact {
    pub fn mode(&self) -> SignatureMode {
        match self {
            SignatureArtifact::Upload { .. } => SignatureMode::Upload,
            SignatureArtifact::Draw { .. } => SignatureMode::Draw,
            SignatureArtifact::Type { .. } => SignatureMode::Type,
        }
    }

    /// Validate the artifact for its mode. No state is touched on failure.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        match self {
            SignatureArtifact::Upload {
                content_type,
                data_base64,
            } => {
                if !content_type.starts_with("image/") {
                    return Err(ArtifactError::NotAnImage(content_type.clone()));
                }
                let data = general_purpose::STANDARD
                    .decode(data_base64.trim())
                    .map_err(|_| ArtifactError::EmptyImage)?;
                if data.is_empty() {
                    return Err(ArtifactError::EmptyImage);
                }
                Ok(())
            }
            SignatureArtifact::Draw { data_url } => {
                let Some(rest) = data_url.strip_prefix("data:image/") else {
                    return Err(ArtifactError::MalformedDataUrl);
                };
                let Some((_, body)) = rest.split_once(";base64,") else {
                    return Err(ArtifactError::MalformedDataUrl);
                };
                if body.trim().is_empty() {
                    return Err(ArtifactError::EmptyDrawing);
                }
                let decoded = general_purpose::STANDARD
                    .decode(body.trim())
                    .map_err(|_| ArtifactError::MalformedDataUrl)?;
                if decoded.is_empty() {
                    return Err(ArtifactError::EmptyDrawing);
                }
                Ok(())
            }
            SignatureArtifact::Type { text } => {
                if text.trim().is_empty() {
                    return Err(ArtifactError::EmptyTypedName);
                }
                Ok(())
            }
        }
    }
}

/// Signature record status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureStatus {
    Pending,
    Signed,
}

impl SignatureStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureStatus::Pending => "pending",
            SignatureStatus::Signed => "signed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(SignatureStatus::Pending),
            "signed" => Some(SignatureStatus::Signed),
            _ => None,
        }
    }
}

/// One signature record per (splitsheet, party)
///
/// Created pending when the splitsheet enters the workflow; marked signed by
/// exactly one accepted submission from that party (re-signing overwrites,
/// never duplicates). Records are superseded, never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRecord {
    pub splitsheet_id: Uuid,
    pub category: ParticipantCategory,
    pub reference_number: u32,
    pub party_name: String,
    pub party_role: String,
    pub entry_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub status: SignatureStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<SignatureMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_at: Option<DateTime<Utc>>,
    /// Signer-link token, unique per record
    #[serde(skip_serializing)]
    pub access_token: String,
}

/// Aggregate workflow state, always derived from the signature set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Created,
    AwaitingSignatures,
    PartiallySigned,
    FullySigned,
    Voided,
}

impl WorkflowState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowState::Created => "created",
            WorkflowState::AwaitingSignatures => "awaiting_signatures",
            WorkflowState::PartiallySigned => "partially_signed",
            WorkflowState::FullySigned => "fully_signed",
            WorkflowState::Voided => "voided",
        }
    }
}

impl std::fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Derive the workflow state from the signature record set.
///
/// Pure function of its inputs: signature order never matters, only the
/// set membership of signed parties.
pub fn derive_state(signatures: &[SignatureRecord], voided: bool) -> WorkflowState {
    if voided {
        return WorkflowState::Voided;
    }
    if signatures.is_empty() {
        return WorkflowState::Created;
    }
    let signed = signatures
        .iter()
        .filter(|s| s.status == SignatureStatus::Signed)
        .count();
    if signed == 0 {
        WorkflowState::AwaitingSignatures
    } else if signed == signatures.len() {
        WorkflowState::FullySigned
    } else {
        WorkflowState::PartiallySigned
    }
}

/// Access-gate projection: content is unlocked only in the fully signed
/// terminal state.
pub fn is_unlocked(state: WorkflowState) -> bool {
    state == WorkflowState::FullySigned
}
