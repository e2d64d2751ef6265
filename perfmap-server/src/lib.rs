//! perfmap-server library
//!
//! REST API over the single `performances` table plus poster upload storage.

use axum::extract::DefaultBodyLimit;
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod error;
pub mod uploads;

pub use uploads::UploadStore;

/// Room for the text fields and multipart framing on top of the poster itself
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Poster storage
    pub uploads: UploadStore,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, uploads: UploadStore) -> Self {
        Self { db, uploads }
    }
}

/// Build application router
///
/// All routes live under `/api`; CORS is open to any origin.
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, put};

    let body_limit = state.uploads.max_bytes() + FORM_OVERHEAD_BYTES;
    let posters = ServeDir::new(state.uploads.dir().to_path_buf());

    Router::new()
        .route("/api/status", get(api::status))
        .route(
            "/api/performances",
            get(api::list_performances).post(api::create_performance),
        )
        .route(
            "/api/performances/:id",
            put(api::update_performance).delete(api::delete_performance),
        )
        .route(
            "/api/performances/province/:province",
            get(api::performances_by_province),
        )
        .route(
            "/api/performances/artist/:artist",
            get(api::performances_by_artist),
        )
        .route("/api/artists", get(api::list_artists))
        .nest_service("/api/uploads", posters)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
