use crate::app::{AdminService, CatalogService, PaymentService, ServiceError, UploadService};
use crate::domain::TransactionMonitor;
use crate::infra::config::Settings;
use crate::infra::mpesa::DarajaClient;
use crate::infra::platform::{PlatformClient, PlatformStorage};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

#[derive(Clone)]
pub struct AppState {
    pub payments: Arc<PaymentService>,
    pub uploads: Arc<UploadService>,
    pub admin: Arc<AdminService>,
    pub catalog: Arc<CatalogService>,
    pub monitor: TransactionMonitor,
}

impl AppState {
    /// Wires the production clients from `settings`. The monitor is passed in so the caller
    /// controls its feed subscription.
    pub fn from_settings(
        settings: &Settings,
        monitor: TransactionMonitor,
    ) -> Result<Self, ServiceError> {
        let platform = PlatformClient::new(settings.platform.clone())?;
        let daraja = DarajaClient::new(settings.mpesa.clone())?;

        Ok(Self {
            payments: Arc::new(PaymentService::new(daraja, &settings.base_url)),
            uploads: Arc::new(UploadService::new(
                Arc::new(PlatformStorage::new(platform.clone())),
                settings.upload.default_bucket.clone(),
            )),
            admin: Arc::new(AdminService::new(platform.clone())),
            catalog: Arc::new(CatalogService::new(platform)),
            monitor,
        })
    }
}

/// Error body returned by every endpoint.
#[derive(Serialize, Debug, ToSchema)]
pub struct ErrorBody {
    pub error: String,
    /// Upstream response body, when the failure came from the payment provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<JsonValue>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Deserialize, Debug, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    /// Restrict to one category id.
    pub category: Option<String>,
    /// Maximum number of products (1-200, default 50).
    pub limit: Option<u32>,
}

/// Multipart body of `POST /api/upload` (documentation only).
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    /// Storage bucket; the configured default bucket when omitted.
    pub bucket: Option<String>,
}

fn upstream_status(status: StatusCode) -> StatusCode {
    if status.is_client_error() || status.is_server_error() {
        status
    } else {
        StatusCode::BAD_GATEWAY
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, details) = match self {
            ServiceError::Validation(_) => (StatusCode::BAD_REQUEST, None),
            ServiceError::NotFound(_) => (StatusCode::NOT_FOUND, None),
            ServiceError::Conflict(_) => (StatusCode::CONFLICT, None),
            ServiceError::UpstreamAuth { status, body }
            | ServiceError::UpstreamRequest { status, body } => {
                (upstream_status(status), Some(body))
            }
            ServiceError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, None),
            ServiceError::Platform { .. } => (StatusCode::BAD_GATEWAY, None),
            ServiceError::Http(e) if e.is_timeout() => (StatusCode::GATEWAY_TIMEOUT, None),
            ServiceError::Http(_) => (StatusCode::BAD_GATEWAY, None),
        };

        if status.is_server_error() {
            error!(%status, "{}", message);
        }

        (status, Json(ErrorBody { error: message, details })).into_response()
    }
}

pub fn json_rejection(err: JsonRejection, expected: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody::new(format!(
            "Invalid JSON body: {} (expected: {})",
            err.body_text(),
            expected
        ))),
    )
        .into_response()
}
