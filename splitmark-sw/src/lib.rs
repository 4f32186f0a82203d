//! splitmark-sw (Splitsheet Workflow) - splitsheet submission, signing and
//! access-gate service
//!
//! Accepts composed splitsheet documents, validates them, tracks per-party
//! signatures and answers access-gate queries for downstream catalogs.

use axum::Router;
use splitmark_common::sse::SseBroadcaster;
use sqlx::SqlitePool;

pub mod api;
pub mod db;
pub mod locks;

use locks::SheetLocks;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Domain event fan-out for SSE subscribers
    pub broadcaster: SseBroadcaster,
    /// Per-splitsheet locks serializing participant mutations
    pub locks: SheetLocks,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool) -> Self {
        Self {
            db,
            broadcaster: SseBroadcaster::new(100),
            locks: SheetLocks::default(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{delete, get, post};
    use tower_http::cors::CorsLayer;
    use tower_http::trace::TraceLayer;

    Router::new()
        .route("/api/splitsheets", post(api::create_splitsheet))
        .route("/api/splitsheets/validate", post(api::validate_preview))
        .route("/api/splitsheets/:id", get(api::get_splitsheet))
        .route("/api/splitsheets/:id/participants", post(api::add_participant))
        .route(
            "/api/splitsheets/:id/participants/:category/:reference",
            delete(api::remove_participant),
        )
        .route("/api/splitsheets/:id/sign", post(api::sign_splitsheet))
        .route("/api/splitsheets/:id/void", post(api::void_splitsheet))
        .route("/api/splitsheets/:id/access", get(api::get_access))
        .route(
            "/api/access/by-reference/:song_reference",
            get(api::get_access_by_reference),
        )
        .route("/events", get(api::event_stream))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
