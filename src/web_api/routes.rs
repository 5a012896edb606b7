//! API Routes

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::services::ServeDir;

use crate::models::PhotosResponse;
use crate::photo_catalog::PHOTOS_URL_PREFIX;
use crate::state::AppState;

/// Create API router
pub fn create_router(state: AppState) -> Router {
    let photos = ServeDir::new(&state.config.photos_dir);

    Router::new()
        // Health
        .route("/api/health", get(super::health_check))
        // Photos
        .route("/api/photos", get(list_photos))
        .route("/api/capture", post(capture_photo))
        // Static photo files
        .nest_service(PHOTOS_URL_PREFIX, photos)
        .fallback(not_found)
        .with_state(state)
}

// ========================================
// Photo Handlers
// ========================================

async fn list_photos(State(state): State<AppState>) -> impl IntoResponse {
    match state.catalog.list_photos().await {
        Ok(photos) => Json(PhotosResponse { photos }).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn capture_photo(State(state): State<AppState>) -> impl IntoResponse {
    match state.orchestrator.capture().await {
        Ok(result) => Json(result).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" })))
}
