use crate::transport::http::types::{ErrorBody, HealthResponse};
use axum::http::{StatusCode, Uri};
use axum::Json;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn healthcheck_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Fallback for unknown paths. Registered before the route guard so that protected prefixes are
/// redirected even when nothing is served under them.
pub async fn not_found_handler(uri: Uri) -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody::new(format!("No route for {}", uri.path()))),
    )
}
