//! Shared test helpers: tempfile-backed app setup and request plumbing

// Each integration test binary compiles this module separately and uses a
// different subset of it
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request},
    Router,
};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tempfile::TempDir;

use splitmark_sw::{build_router, AppState};

/// A 1x1 transparent PNG, the smallest plausible signature raster
pub const TINY_PNG_B64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

/// Create an app backed by a fresh database in a temp folder.
///
/// The TempDir must stay alive for the duration of the test.
pub async fn setup_app() -> (TempDir, Router, SqlitePool) {
    let dir = tempfile::tempdir().expect("Should create temp dir");
    let db_path = dir.path().join("splitmark.db");

    let pool = splitmark_common::db::init_database(&db_path)
        .await
        .expect("Should initialize test database");

    let state = AppState::new(pool.clone());
    (dir, build_router(state), pool)
}

/// Build a JSON request
pub fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Build a body-less request
pub fn request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Extract JSON body from a response
pub async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

/// A complete, valid splitsheet document with one party per required
/// category (five signing parties). Music ownership stays within the
/// 25% melody validation cap.
pub fn complete_document(song_reference: &str) -> Value {
    json!({
        "song_title": "Harbor Lights",
        "song_reference": song_reference,
        "agreement_date": "2025-11-02",
        "writer_composers": [{
            "reference_number": 1,
            "name": "Ana Mercier",
            "address": "4 Quay Street, Roseview",
            "email": "ana@example.com",
            "songwriting_percentage": 50,
            "role": "Songwriter/Composer"
        }],
        "recording_artists": [{
            "reference_number": 1,
            "name": "Ben Okafor",
            "address": "9 Shore Road, Roseview",
            "email": "ben@example.com",
            "music_ownership": 25
        }],
        "labels": [{
            "reference_number": 1,
            "name": "Northway Records",
            "address": "1 Commerce Way, Roseview",
            "email": "label@example.com",
            "label_name": "Northway Records",
            "artist": "Ben Okafor"
        }],
        "studios": [{
            "reference_number": 1,
            "name": "Harbor Lane Studio",
            "address": "12 Harbor Lane, Roseview",
            "studio_name": "Harbor Lane Studio"
        }],
        "publishers": [{
            "reference_number": 1,
            "name": "Northway Publishing",
            "address": "1 Commerce Way, Roseview",
            "email": "publishing@example.com",
            "publisher_name": "Northway Publishing",
            "publishing_percentage": 100
        }]
    })
}

/// Sign payload for one party using the typed-name method
pub fn typed_sign_payload(category: &str, reference: u32, name: &str) -> Value {
    json!({
        "party_category": category,
        "party_reference": reference,
        "signature_mode": "type",
        "signature_text": name,
    })
}

/// The five (category, reference, name) parties of `complete_document`
pub fn required_parties() -> [(&'static str, u32, &'static str); 5] {
    [
        ("writer_composer", 1, "Ana Mercier"),
        ("recording_artist", 1, "Ben Okafor"),
        ("label", 1, "Northway Records"),
        ("studio", 1, "Harbor Lane Studio"),
        ("publisher", 1, "Northway Publishing"),
    ]
}
