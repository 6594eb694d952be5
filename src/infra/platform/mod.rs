//! Client for the hosted backend platform (PostgREST tables, GoTrue auth, object storage).
//!
//! Every request carries the platform `apikey` header plus a bearer token. Server-side calls use
//! the service-role key; the only anon-key call is the confirmation-email resend, which is a
//! public auth endpoint.

pub mod auth;
pub mod rest;
pub mod schema;
pub mod storage;

pub use auth::AuthUser;
pub use storage::{ObjectStorage, PlatformStorage};

use crate::app::error::{upstream_body, upstream_message, ServiceError};
use crate::infra::config::PlatformSettings;
use reqwest::{Method, RequestBuilder, Response};
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub struct PlatformClient {
    http: reqwest::Client,
    settings: Arc<PlatformSettings>,
}

impl PlatformClient {
    pub fn new(settings: PlatformSettings) -> Result<Self, ServiceError> {
        Ok(Self {
            http: reqwest::Client::builder().build()?,
            settings: Arc::new(settings),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.settings.url
    }

    /// Request authenticated with the service-role key (bypasses row-level policies).
    pub(crate) fn service(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.settings.url, path))
            .header("apikey", &self.settings.service_role_key)
            .bearer_auth(&self.settings.service_role_key)
    }

    /// Request authenticated with the public anon key.
    pub(crate) fn anon(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.settings.url, path))
            .header("apikey", &self.settings.anon_key)
            .bearer_auth(&self.settings.anon_key)
    }

    /// Turns a non-success platform response into `ServiceError::Platform`.
    pub(crate) async fn check(response: Response) -> Result<Response, ServiceError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let url = response.url().path().to_string();
        let body = upstream_body(response).await;
        let message = upstream_message(&body);
        warn!(%status, path = %url, %message, "Platform request failed");
        Err(ServiceError::Platform { status, message })
    }
}
