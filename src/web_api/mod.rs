//! WebAPI - REST API Endpoints
//!
//! ## Responsibilities
//!
//! - HTTP API routes (`/api/health`, `/api/photos`, `/api/capture`)
//! - Static photo serving under `/photos`
//! - JSON error bodies for every failure

mod routes;

pub use routes::create_router;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::models::HealthResponse;
use crate::state::AppState;

/// Health check endpoint
///
/// Always answers 200; an unusable camera shows up as `ready: false`.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let detail = state.prober.check_readiness().await;

    let response = HealthResponse {
        ok: detail.ready,
        ready: detail.ready,
        mock: state.config.use_mock,
        camera_command: state.config.camera_cmd.clone(),
        photos_dir: state.config.photos_dir.display().to_string(),
        capturing: state.orchestrator.is_busy(),
        detail,
    };

    Json(response)
}
