// Responsible for all communication with the M-PESA Daraja API.

use crate::app::error::{upstream_body, ServiceError};
use crate::domain::payment::{AccessToken, StkPushPayload};
use crate::infra::config::MpesaSettings;
use reqwest::StatusCode;
use serde_json::Value as JsonValue;
use tracing::{debug, error};

const TOKEN_PATH: &str = "/oauth/v1/generate";
const STK_PUSH_PATH: &str = "/mpesa/stkpush/v1/processrequest";

/// Thin client over the two Daraja endpoints the checkout needs. No retries: each call is
/// made exactly once and its failure is reported as-is.
pub struct DarajaClient {
    http: reqwest::Client,
    settings: MpesaSettings,
}

impl DarajaClient {
    pub fn new(settings: MpesaSettings) -> Result<Self, ServiceError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            settings,
        })
    }

    pub fn settings(&self) -> &MpesaSettings {
        &self.settings
    }

    /// Exchanges the consumer key pair for a bearer token (OAuth client credentials).
    pub async fn access_token(&self) -> Result<String, ServiceError> {
        let url = format!("{}{}", self.settings.base_url, TOKEN_PATH);
        let response = self
            .http
            .get(&url)
            .query(&[("grant_type", "client_credentials")])
            .basic_auth(&self.settings.consumer_key, Some(&self.settings.consumer_secret))
            .send()
            .await?;

        let status = response.status();
        let body = upstream_body(response).await;
        if !status.is_success() {
            error!(%status, %body, "M-PESA token request rejected");
            return Err(ServiceError::UpstreamAuth { status, body });
        }

        match serde_json::from_value::<AccessToken>(body.clone()) {
            Ok(token) => {
                debug!(expires_in = ?token.expires_in, "Obtained M-PESA access token");
                Ok(token.access_token)
            }
            Err(e) => {
                error!(%body, "M-PESA token response has no access_token: {}", e);
                Err(ServiceError::UpstreamAuth {
                    status: StatusCode::BAD_GATEWAY,
                    body,
                })
            }
        }
    }

    /// Submits an STK push request and returns the provider's response body unchanged.
    pub async fn stk_push(
        &self,
        access_token: &str,
        payload: &StkPushPayload,
    ) -> Result<JsonValue, ServiceError> {
        let url = format!("{}{}", self.settings.base_url, STK_PUSH_PATH);
        let response = self
            .http
            .post(&url)
            .bearer_auth(access_token)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        let body = upstream_body(response).await;
        if !status.is_success() {
            error!(%status, %body, "M-PESA STK push rejected");
            return Err(ServiceError::UpstreamRequest { status, body });
        }
        Ok(body)
    }
}
