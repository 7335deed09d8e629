//! Health check endpoint.

use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// GET /health: liveness only, no dependency checks.
pub async fn check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "UP" })
}
