//! Event types for the SplitMark event system
//!
//! Broadcast to SSE subscribers so downstream consumers (catalog, delivery)
//! can invalidate cached access decisions instead of polling.

use crate::signature::WorkflowState;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// SplitMark event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SplitmarkEvent {
    /// A validated splitsheet entered the signing workflow
    SplitsheetCreated {
        splitsheet_id: Uuid,
        song_reference: String,
        total_parties: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// One party's signature was recorded
    SignatureRecorded {
        splitsheet_id: Uuid,
        entry_id: String,
        party_name: String,
        signed_count: usize,
        total_parties: usize,
        state: WorkflowState,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The last required signature landed; the access gate is now open
    SplitsheetFullySigned {
        splitsheet_id: Uuid,
        song_reference: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The splitsheet was administratively voided
    SplitsheetVoided {
        splitsheet_id: Uuid,
        song_reference: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl SplitmarkEvent {
    /// SSE event name for this variant
    pub fn event_name(&self) -> &'static str {
        match self {
            SplitmarkEvent::SplitsheetCreated { .. } => "SplitsheetCreated",
            SplitmarkEvent::SignatureRecorded { .. } => "SignatureRecorded",
            SplitmarkEvent::SplitsheetFullySigned { .. } => "SplitsheetFullySigned",
            SplitmarkEvent::SplitsheetVoided { .. } => "SplitsheetVoided",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization_carries_type_tag() {
        let event = SplitmarkEvent::SplitsheetFullySigned {
            splitsheet_id: Uuid::nil(),
            song_reference: "SR-100".to_string(),
            timestamp: chrono::Utc::now(),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"SplitsheetFullySigned\""));
        assert!(json.contains("SR-100"));
    }

    #[test]
    fn test_event_names_match_variants() {
        let event = SplitmarkEvent::SplitsheetCreated {
            splitsheet_id: Uuid::nil(),
            song_reference: "SR-100".to_string(),
            total_parties: 5,
            timestamp: chrono::Utc::now(),
        };
        assert_eq!(event.event_name(), "SplitsheetCreated");
    }
}
