use crate::domain::MonitoredOrder;
use crate::transport::http::types::AppState;
use axum::extract::State;
use axum::Json;

#[utoipa::path(
    get,
    path = "/admin/transactions",
    responses(
        (status = 200, description = "Orders seen on the change feed, most recently changed first", body = Vec<MonitoredOrder>),
        (status = 307, description = "No session cookie; redirected to the login page")
    )
)]
pub async fn transactions_handler(State(state): State<AppState>) -> Json<Vec<MonitoredOrder>> {
    Json(state.monitor.snapshot().await)
}
