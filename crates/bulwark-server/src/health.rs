use axum::Json;
use axum::response::IntoResponse;
use http::StatusCode;

/// Liveness probe
pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}
