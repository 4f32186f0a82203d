//! Splitsheet workflow queries
//!
//! The splitsheet document is persisted whole as JSON in one row; signature
//! records are normalized, one row per (splitsheet, party), so concurrent
//! signature submissions from different parties touch disjoint rows.

use rand::RngCore;
use std::fmt::Write as _;
use splitmark_common::db::models::{SignatureRow, SplitsheetRow};
use splitmark_common::participant::ParticipantCategory;
use splitmark_common::signature::{SignatureMode, SignatureRecord, SignatureStatus};
use splitmark_common::splitsheet::{SigningParty, Splitsheet};
use splitmark_common::{Error, Result};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Notification type written when a party is asked to sign
pub const NOTIFY_SIGNATURE_REQUEST: &str = "signature_request";
/// Notification type written when the last signature lands
pub const NOTIFY_COMPLETED: &str = "splitsheet_completed";

/// Generate a signer-link access token (32 random bytes, hex)
pub fn generate_access_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().fold(String::with_capacity(64), |mut s, b| {
        let _ = write!(s, "{:02x}", b);
        s
    })
}

/// Persist a validated document and create its pending signature records
/// and signature-request notifications in one transaction.
///
/// Returns the new splitsheet id and the number of notifications recorded.
pub async fn insert_splitsheet(pool: &SqlitePool, sheet: &Splitsheet) -> Result<(Uuid, usize)> {
    let id = Uuid::new_v4();
    let document = serde_json::to_string(sheet)
        .map_err(|e| Error::Internal(format!("Document serialization failed: {}", e)))?;
    let now = chrono::Utc::now().to_rfc3339();

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO splitsheets (guid, song_title, song_reference, agreement_date, voided, document, created_at, updated_at)
        VALUES (?, ?, ?, ?, 0, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(&sheet.song_title)
    .bind(&sheet.song_reference)
    .bind(&sheet.agreement_date)
    .bind(&document)
    .bind(&now)
    .bind(&now)
    .execute(&mut *tx)
    .await?;

    let mut notifications = 0;
    for party in sheet.parties() {
        let token = generate_access_token();
        insert_signature_row(&mut tx, id, &party, &token).await?;
        insert_notification_row(&mut tx, id, &party, NOTIFY_SIGNATURE_REQUEST, Some(&token))
            .await?;
        notifications += 1;
    }

    tx.commit().await?;
    Ok((id, notifications))
}

/// True if a splitsheet with this song reference already exists
pub async fn reference_exists(pool: &SqlitePool, song_reference: &str) -> Result<bool> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM splitsheets WHERE song_reference = ?)")
            .bind(song_reference)
            .fetch_one(pool)
            .await?;
    Ok(exists)
}

/// Load a splitsheet row and its parsed document
pub async fn load_splitsheet(
    pool: &SqlitePool,
    id: Uuid,
) -> Result<Option<(SplitsheetRow, Splitsheet)>> {
    let row: Option<SplitsheetRow> =
        sqlx::query_as("SELECT * FROM splitsheets WHERE guid = ?")
            .bind(id.to_string())
            .fetch_optional(pool)
            .await?;

    row.map(parse_document).transpose()
}

/// Load a splitsheet by its business identity
pub async fn load_splitsheet_by_reference(
    pool: &SqlitePool,
    song_reference: &str,
) -> Result<Option<(SplitsheetRow, Splitsheet)>> {
    let row: Option<SplitsheetRow> =
        sqlx::query_as("SELECT * FROM splitsheets WHERE song_reference = ?")
            .bind(song_reference)
            .fetch_optional(pool)
            .await?;

    row.map(parse_document).transpose()
}

fn parse_document(row: SplitsheetRow) -> Result<(SplitsheetRow, Splitsheet)> {
    let sheet: Splitsheet = serde_json::from_str(&row.document)
        .map_err(|e| Error::Internal(format!("Stored document is corrupt: {}", e)))?;
    Ok((row, sheet))
}

/// Persist a mutated document and bring the signature rows in sync with its
/// party set. Caller holds the per-splitsheet lock and has already verified
/// that no signature has been recorded yet.
pub async fn store_document(pool: &SqlitePool, id: Uuid, sheet: &Splitsheet) -> Result<usize> {
    let document = serde_json::to_string(sheet)
        .map_err(|e| Error::Internal(format!("Document serialization failed: {}", e)))?;
    let now = chrono::Utc::now().to_rfc3339();

    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE splitsheets SET document = ?, updated_at = ? WHERE guid = ?")
        .bind(&document)
        .bind(&now)
        .bind(id.to_string())
        .execute(&mut *tx)
        .await?;

    // Sync party rows: drop parties no longer present, update retained
    // entries (renumbering shifts names onto existing keys), insert new
    // parties with fresh tokens and a signature-request notification.
    let existing: Vec<(String, i64)> = sqlx::query_as(
        "SELECT party_category, party_reference FROM signatures WHERE splitsheet_guid = ?",
    )
    .bind(id.to_string())
    .fetch_all(&mut *tx)
    .await?;

    let desired = sheet.parties();
    let mut notifications = 0;

    for (category, reference) in &existing {
        let keep = desired.iter().any(|p| {
            p.category.as_str() == category && i64::from(p.reference_number) == *reference
        });
        if !keep {
            sqlx::query(
                "DELETE FROM signatures WHERE splitsheet_guid = ? AND party_category = ? AND party_reference = ?",
            )
            .bind(id.to_string())
            .bind(category)
            .bind(reference)
            .execute(&mut *tx)
            .await?;
        }
    }

    for party in &desired {
        let known = existing.iter().any(|(category, reference)| {
            party.category.as_str() == category && i64::from(party.reference_number) == *reference
        });
        if known {
            sqlx::query(
                r#"
                UPDATE signatures
                SET party_name = ?, party_role = ?, entry_id = ?, email = ?, updated_at = ?
                WHERE splitsheet_guid = ? AND party_category = ? AND party_reference = ?
                "#,
            )
            .bind(&party.name)
            .bind(&party.role)
            .bind(&party.entry_id)
            .bind(&party.email)
            .bind(&now)
            .bind(id.to_string())
            .bind(party.category.as_str())
            .bind(i64::from(party.reference_number))
            .execute(&mut *tx)
            .await?;
        } else {
            let token = generate_access_token();
            insert_signature_row(&mut tx, id, party, &token).await?;
            insert_notification_row(&mut tx, id, party, NOTIFY_SIGNATURE_REQUEST, Some(&token))
                .await?;
            notifications += 1;
        }
    }

    tx.commit().await?;
    Ok(notifications)
}

async fn insert_signature_row(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    id: Uuid,
    party: &SigningParty,
    token: &str,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO signatures
            (splitsheet_guid, party_category, party_reference, party_name, party_role, entry_id, email, status, access_token)
        VALUES (?, ?, ?, ?, ?, ?, ?, 'pending', ?)
        "#,
    )
    .bind(id.to_string())
    .bind(party.category.as_str())
    .bind(i64::from(party.reference_number))
    .bind(&party.name)
    .bind(&party.role)
    .bind(&party.entry_id)
    .bind(&party.email)
    .bind(token)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

async fn insert_notification_row(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    id: Uuid,
    party: &SigningParty,
    notification_type: &str,
    token: Option<&str>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO notifications
            (guid, splitsheet_guid, recipient_name, recipient_email, entry_id, notification_type, access_token)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(id.to_string())
    .bind(&party.name)
    .bind(&party.email)
    .bind(&party.entry_id)
    .bind(notification_type)
    .bind(token)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Load all signature records for a splitsheet
pub async fn load_signatures(pool: &SqlitePool, id: Uuid) -> Result<Vec<SignatureRecord>> {
    let rows: Vec<SignatureRow> = sqlx::query_as(
        "SELECT * FROM signatures WHERE splitsheet_guid = ? ORDER BY party_category, party_reference",
    )
    .bind(id.to_string())
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(row_to_record).collect()
}

/// Find the signature row matching a signer-link token
pub async fn find_signature_by_token(
    pool: &SqlitePool,
    token: &str,
) -> Result<Option<SignatureRecord>> {
    let row: Option<SignatureRow> =
        sqlx::query_as("SELECT * FROM signatures WHERE access_token = ?")
            .bind(token)
            .fetch_optional(pool)
            .await?;

    row.map(row_to_record).transpose()
}

fn row_to_record(row: SignatureRow) -> Result<SignatureRecord> {
    let splitsheet_id = Uuid::parse_str(&row.splitsheet_guid)
        .map_err(|e| Error::Internal(format!("Bad splitsheet guid in signatures: {}", e)))?;
    let category = ParticipantCategory::from_str(&row.party_category).ok_or_else(|| {
        Error::Internal(format!("Unknown party category: {}", row.party_category))
    })?;
    let status = SignatureStatus::from_str(&row.status)
        .ok_or_else(|| Error::Internal(format!("Unknown signature status: {}", row.status)))?;
    let signed_at = row
        .signed_at
        .as_deref()
        .map(|s| {
            chrono::DateTime::parse_from_rfc3339(s)
                .map(|t| t.with_timezone(&chrono::Utc))
                .map_err(|e| Error::Internal(format!("Bad signed_at timestamp: {}", e)))
        })
        .transpose()?;

    Ok(SignatureRecord {
        splitsheet_id,
        category,
        reference_number: row.party_reference as u32,
        party_name: row.party_name,
        party_role: row.party_role,
        entry_id: row.entry_id,
        email: row.email,
        status,
        mode: row.mode.as_deref().and_then(SignatureMode::from_str),
        signed_at,
        access_token: row.access_token,
    })
}

/// Mark one party's signature record signed, storing the artifact.
///
/// Upsert semantics on an existing row: re-signing overwrites the previous
/// artifact and timestamp; it never duplicates the record. Returns false if
/// the party has no record on this splitsheet.
pub async fn record_signature(
    pool: &SqlitePool,
    id: Uuid,
    category: ParticipantCategory,
    reference_number: u32,
    mode: SignatureMode,
    artifact_json: &str,
) -> Result<bool> {
    let now = chrono::Utc::now().to_rfc3339();
    let result = sqlx::query(
        r#"
        UPDATE signatures
        SET status = 'signed', mode = ?, artifact = ?, signed_at = ?, updated_at = ?
        WHERE splitsheet_guid = ? AND party_category = ? AND party_reference = ?
        "#,
    )
    .bind(mode.as_str())
    .bind(artifact_json)
    .bind(&now)
    .bind(&now)
    .bind(id.to_string())
    .bind(category.as_str())
    .bind(i64::from(reference_number))
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Mark a splitsheet voided. Returns false if it does not exist.
pub async fn void_splitsheet(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("UPDATE splitsheets SET voided = 1, updated_at = ? WHERE guid = ?")
        .bind(chrono::Utc::now().to_rfc3339())
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Record completion notifications for every party once fully signed
pub async fn insert_completion_notifications(
    pool: &SqlitePool,
    id: Uuid,
    sheet: &Splitsheet,
) -> Result<usize> {
    let mut tx = pool.begin().await?;
    let parties = sheet.parties();
    for party in &parties {
        insert_notification_row(&mut tx, id, party, NOTIFY_COMPLETED, None).await?;
    }
    tx.commit().await?;
    Ok(parties.len())
}

/// Count notification rows recorded for a splitsheet
pub async fn notification_count(pool: &SqlitePool, id: Uuid) -> Result<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE splitsheet_guid = ?")
            .bind(id.to_string())
            .fetch_one(pool)
            .await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_tokens_are_64_hex_chars_and_unique() {
        let a = generate_access_token();
        let b = generate_access_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
