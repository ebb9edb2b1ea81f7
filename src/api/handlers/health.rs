use crate::AppState;
use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    /// "ready" once the object store client is connected, "idle" before
    pub backend: String,
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Gateway health status", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let backend = if state.store.is_ready() {
        "ready"
    } else {
        "idle"
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        backend: backend.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
