use crate::app::admin_service::{AdminStatus, CreateAdminRequest, CreatedAdmin};
use crate::transport::http::types::{json_rejection, AppState, ErrorBody};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

#[utoipa::path(
    get,
    path = "/api/admin/create-admin",
    responses(
        (status = 200, description = "Whether an administrator account exists", body = AdminStatus),
        (status = 502, description = "Platform request failed", body = ErrorBody)
    )
)]
pub async fn admin_status_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.admin.status().await {
        Ok(status) => Json(status).into_response(),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/admin/create-admin",
    request_body = CreateAdminRequest,
    responses(
        (status = 201, description = "Administrator created", body = CreatedAdmin),
        (status = 400, description = "Email or password missing", body = ErrorBody),
        (status = 409, description = "An administrator already exists", body = ErrorBody),
        (status = 502, description = "Platform request failed", body = ErrorBody)
    )
)]
pub async fn create_admin_handler(
    State(state): State<AppState>,
    request: Result<Json<CreateAdminRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => return json_rejection(e, "{ email, password, fullName? }"),
    };

    match state.admin.create_initial_admin(&request).await {
        Ok(created) => (StatusCode::CREATED, Json(created)).into_response(),
        Err(e) => e.into_response(),
    }
}
