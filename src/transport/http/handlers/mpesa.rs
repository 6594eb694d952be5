use crate::domain::payment::{CallbackAck, StkPushRequest};
use crate::transport::http::types::{json_rejection, AppState, ErrorBody};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::Value as JsonValue;

#[utoipa::path(
    post,
    path = "/api/mpesa/stkpush",
    request_body = StkPushRequest,
    responses(
        (status = 200, description = "Provider accepted the push; its response body is returned as-is"),
        (status = 400, description = "Missing phone number or amount, or the provider rejected the request", body = ErrorBody),
        (status = 401, description = "Provider rejected the token exchange", body = ErrorBody),
        (status = 502, description = "Provider unreachable", body = ErrorBody)
    )
)]
pub async fn stk_push_handler(
    State(state): State<AppState>,
    request: Result<Json<StkPushRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => return json_rejection(e, "{ phoneNumber, amount }"),
    };

    match state.payments.initiate(&request).await {
        Ok(provider_response) => Json(provider_response).into_response(),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/mpesa/callback",
    request_body = Object,
    responses(
        (status = 200, description = "Callback acknowledged", body = CallbackAck)
    )
)]
pub async fn callback_handler(
    State(state): State<AppState>,
    body: Result<Json<JsonValue>, JsonRejection>,
) -> Json<CallbackAck> {
    let raw = match body {
        Ok(Json(v)) => v,
        Err(e) => JsonValue::String(e.body_text()),
    };
    Json(state.payments.acknowledge_callback(&raw))
}
