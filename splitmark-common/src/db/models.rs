//! Database row models

use serde::{Deserialize, Serialize};

/// One stored splitsheet (document persisted as JSON)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SplitsheetRow {
    pub guid: String,
    pub song_title: String,
    pub song_reference: String,
    pub agreement_date: Option<String>,
    pub voided: bool,
    pub document: String,
    pub created_at: String,
    pub updated_at: String,
}

/// One signature record row, keyed (splitsheet_guid, party_category, party_reference)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SignatureRow {
    pub splitsheet_guid: String,
    pub party_category: String,
    pub party_reference: i64,
    pub party_name: String,
    pub party_role: String,
    pub entry_id: String,
    pub email: Option<String>,
    pub status: String,
    pub mode: Option<String>,
    pub artifact: Option<String>,
    pub signed_at: Option<String>,
    pub access_token: String,
}

/// One notification bookkeeping row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct NotificationRow {
    pub guid: String,
    pub splitsheet_guid: String,
    pub recipient_name: String,
    pub recipient_email: Option<String>,
    pub entry_id: String,
    pub notification_type: String,
    pub access_token: Option<String>,
    pub sent: bool,
    pub sent_at: Option<String>,
}
