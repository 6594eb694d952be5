//! Payment bridge: STK Push initiation and the provider callback.
//!
//! Initiation is two sequential provider calls (token, then push). Nothing is stored locally and
//! the result arrives later on the callback URL. The callback is acknowledged and logged only;
//! no order is reconciled against it.

use crate::app::error::ServiceError;
use crate::domain::payment::{
    provider_timestamp, stk_password, CallbackAck, PaymentOrder, StkCallbackEnvelope,
    StkPushPayload, StkPushRequest, TRANSACTION_TYPE,
};
use crate::infra::mpesa::DarajaClient;
use chrono::Utc;
use serde_json::Value as JsonValue;
use tracing::{info, warn};

pub const CALLBACK_PATH: &str = "/api/mpesa/callback";

pub struct PaymentService {
    client: DarajaClient,
    callback_url: String,
}

impl PaymentService {
    /// `base_url` is this service's public URL; the provider calls back on
    /// `{base_url}/api/mpesa/callback`.
    pub fn new(client: DarajaClient, base_url: &str) -> Self {
        Self {
            client,
            callback_url: format!("{}{}", base_url.trim_end_matches('/'), CALLBACK_PATH),
        }
    }

    pub fn callback_url(&self) -> &str {
        &self.callback_url
    }

    /// Validates the request, then obtains a token and submits the push. Validation failures
    /// make no outbound call; a token failure skips the push.
    pub async fn initiate(&self, request: &StkPushRequest) -> Result<JsonValue, ServiceError> {
        let order = request.validate()?;

        let access_token = self.client.access_token().await?;
        let payload = self.build_payload(&order, &provider_timestamp(Utc::now()));

        info!(
            phone = %order.phone_number,
            amount = order.amount,
            "Submitting STK push"
        );
        let response = self.client.stk_push(&access_token, &payload).await?;
        info!(
            checkout_request_id = ?response.get("CheckoutRequestID"),
            "STK push accepted by provider"
        );
        Ok(response)
    }

    pub fn build_payload(&self, order: &PaymentOrder, timestamp: &str) -> StkPushPayload {
        let settings = self.client.settings();
        StkPushPayload {
            business_short_code: settings.shortcode.clone(),
            password: stk_password(&settings.shortcode, &settings.passkey, timestamp),
            timestamp: timestamp.to_string(),
            transaction_type: TRANSACTION_TYPE,
            amount: order.amount,
            party_a: order.phone_number.clone(),
            party_b: settings.shortcode.clone(),
            phone_number: order.phone_number.clone(),
            call_back_url: self.callback_url.clone(),
            account_reference: settings.account_reference.clone(),
            transaction_desc: settings.transaction_desc.clone(),
        }
    }

    /// Logs the provider's result and acknowledges it. Unparseable bodies are acknowledged too
    /// so the provider does not keep retrying.
    pub fn acknowledge_callback(&self, raw: &JsonValue) -> CallbackAck {
        match serde_json::from_value::<StkCallbackEnvelope>(raw.clone()) {
            Ok(envelope) => {
                let callback = envelope.body.stk_callback;
                info!(
                    checkout_request_id = %callback.checkout_request_id,
                    merchant_request_id = ?callback.merchant_request_id,
                    result_code = callback.result_code,
                    result_desc = ?callback.result_desc,
                    receipt = ?callback.receipt_number(),
                    "Received M-PESA callback"
                );
            }
            Err(e) => {
                warn!(body = %raw, "Unrecognised M-PESA callback body: {}", e);
            }
        }
        CallbackAck::accepted()
    }
}
