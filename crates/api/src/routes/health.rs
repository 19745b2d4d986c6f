//! Health and readiness endpoints. Mounted at the root, outside `/api/v1`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(liveness))
        .route("/health/ready", get(readiness))
}

/// Process is up.
async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Process is up and the database answers.
async fn readiness(State(state): State<AppState>) -> Result<Json<HealthResponse>, StatusCode> {
    match motorpool_db::health_check(&state.pool).await {
        Ok(()) => Ok(Json(HealthResponse { status: "ready" })),
        Err(err) => {
            tracing::error!(error = %err, "readiness check failed");
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}
