//! Database initialization
//!
//! Creates the database on first run and brings the schema up idempotently.
//! Every create function is `CREATE TABLE IF NOT EXISTS`, safe to call on
//! every startup.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Default publisher credited with 100% of publishing when a document
/// leaves the publisher list to the house default
pub const SETTING_DEFAULT_PUBLISHER: &str = "default_publisher_name";
/// Optional regex the song reference must match; empty disables the check
pub const SETTING_SONG_REFERENCE_PATTERN: &str = "song_reference_pattern";

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL mode allows concurrent readers with one writer; signature
    // submissions from different parties arrive concurrently
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    // Set busy timeout
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_splitsheets_table(&pool).await?;
    create_signatures_table(&pool).await?;
    create_notifications_table(&pool).await?;
    create_settings_table(&pool).await?;

    init_default_settings(&pool).await?;

    Ok(pool)
}

async fn create_splitsheets_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS splitsheets (
            guid TEXT PRIMARY KEY,
            song_title TEXT NOT NULL,
            song_reference TEXT NOT NULL UNIQUE,
            agreement_date TEXT,
            voided INTEGER NOT NULL DEFAULT 0,
            document TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_signatures_table(pool: &SqlitePool) -> Result<()> {
    // One row per (splitsheet, party); signing upserts, never inserts a
    // duplicate. Rows are superseded in place, not deleted.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS signatures (
            splitsheet_guid TEXT NOT NULL REFERENCES splitsheets(guid),
            party_category TEXT NOT NULL,
            party_reference INTEGER NOT NULL,
            party_name TEXT NOT NULL,
            party_role TEXT NOT NULL,
            entry_id TEXT NOT NULL,
            email TEXT,
            status TEXT NOT NULL DEFAULT 'pending',
            mode TEXT,
            artifact TEXT,
            signed_at TEXT,
            access_token TEXT NOT NULL UNIQUE,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (splitsheet_guid, party_category, party_reference)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_notifications_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS notifications (
            guid TEXT PRIMARY KEY,
            splitsheet_guid TEXT NOT NULL REFERENCES splitsheets(guid),
            recipient_name TEXT NOT NULL,
            recipient_email TEXT,
            entry_id TEXT NOT NULL,
            notification_type TEXT NOT NULL,
            access_token TEXT,
            sent INTEGER NOT NULL DEFAULT 0,
            sent_at TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the settings table
///
/// Stores application configuration key-value pairs.
pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Initialize default settings
async fn init_default_settings(pool: &SqlitePool) -> Result<()> {
    ensure_setting(pool, SETTING_DEFAULT_PUBLISHER, "SplitMark Publishing").await?;
    ensure_setting(pool, SETTING_SONG_REFERENCE_PATTERN, "").await?;
    Ok(())
}

async fn ensure_setting(pool: &SqlitePool, key: &str, default_value: &str) -> Result<()> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM settings WHERE key = ?)")
        .bind(key)
        .fetch_one(pool)
        .await?;

    if !exists {
        // INSERT OR IGNORE handles concurrent initialization races
        sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(default_value)
            .execute(pool)
            .await?;

        info!(
            "Initialized setting '{}' with default value: {}",
            key, default_value
        );
    }

    Ok(())
}

/// Read a setting value, falling back to the given default when absent
pub async fn get_setting(pool: &SqlitePool, key: &str, default: &str) -> Result<String> {
    let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;

    Ok(value.unwrap_or_else(|| default.to_string()))
}

/// Write a setting value
pub async fn set_setting(pool: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO settings (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;

    Ok(())
}
