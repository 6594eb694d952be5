//! STK Push request/callback shapes and the pure pieces of the payment handshake.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;

use crate::app::error::ServiceError;

/// Daraja's only STK transaction type for paybill shortcodes.
pub const TRANSACTION_TYPE: &str = "CustomerPayBillOnline";

/// Provider timestamps are East Africa Time.
const EAT_OFFSET_SECS: i64 = 3 * 3600;

/// Inbound body of `POST /api/mpesa/stkpush`. Both fields stay loosely typed so that
/// missing, null and wrong-typed values can be reported as validation errors.
#[derive(Deserialize, Debug, Default, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StkPushRequest {
    #[serde(default)]
    #[schema(value_type = String, example = "254712345678")]
    pub phone_number: Option<JsonValue>,
    #[serde(default)]
    #[schema(value_type = f64, example = 1500)]
    pub amount: Option<JsonValue>,
}

/// A validated payment order: phone as given, amount as a whole number of shillings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentOrder {
    pub phone_number: String,
    pub amount: i64,
}

impl StkPushRequest {
    pub fn validate(&self) -> Result<PaymentOrder, ServiceError> {
        let phone_number = match &self.phone_number {
            Some(JsonValue::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            Some(JsonValue::Number(n)) => n.to_string(),
            _ => return Err(missing_fields()),
        };

        let amount = match &self.amount {
            None | Some(JsonValue::Null) => return Err(missing_fields()),
            Some(v) => coerce_amount(v)?,
        };
        if amount == 0 {
            return Err(missing_fields());
        }

        Ok(PaymentOrder {
            phone_number,
            amount,
        })
    }
}

fn missing_fields() -> ServiceError {
    ServiceError::validation("Phone number and amount are required")
}

/// Truncates a JSON number or numeric string to a whole amount.
pub fn coerce_amount(value: &JsonValue) -> Result<i64, ServiceError> {
    let as_float = match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) if s.trim().is_empty() => return Err(missing_fields()),
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match as_float {
        Some(f) if f.is_finite() => Ok(f.trunc() as i64),
        _ => Err(ServiceError::validation(format!(
            "Amount must be numeric, got {}",
            value
        ))),
    }
}

/// `YYYYMMDDHHMMSS` in East Africa Time.
pub fn provider_timestamp(now: DateTime<Utc>) -> String {
    (now.naive_utc() + Duration::seconds(EAT_OFFSET_SECS))
        .format("%Y%m%d%H%M%S")
        .to_string()
}

/// `base64(shortcode + passkey + timestamp)`.
pub fn stk_password(shortcode: &str, passkey: &str, timestamp: &str) -> String {
    BASE64.encode(format!("{}{}{}", shortcode, passkey, timestamp))
}

/// Body of the provider's `processrequest` call.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct StkPushPayload {
    pub business_short_code: String,
    pub password: String,
    pub timestamp: String,
    pub transaction_type: &'static str,
    pub amount: i64,
    pub party_a: String,
    pub party_b: String,
    pub phone_number: String,
    #[serde(rename = "CallBackURL")]
    pub call_back_url: String,
    pub account_reference: String,
    pub transaction_desc: String,
}

/// Response of the provider's client-credentials exchange.
#[derive(Deserialize, Debug)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<JsonValue>,
}

/// Provider result callback (`{ "Body": { "stkCallback": { ... } } }`).
#[derive(Deserialize, Debug)]
pub struct StkCallbackEnvelope {
    #[serde(rename = "Body")]
    pub body: StkCallbackBody,
}

#[derive(Deserialize, Debug)]
pub struct StkCallbackBody {
    #[serde(rename = "stkCallback")]
    pub stk_callback: StkCallback,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
pub struct StkCallback {
    #[serde(rename = "MerchantRequestID", default)]
    pub merchant_request_id: Option<String>,
    #[serde(rename = "CheckoutRequestID")]
    pub checkout_request_id: String,
    pub result_code: i64,
    #[serde(default)]
    pub result_desc: Option<String>,
    #[serde(default)]
    pub callback_metadata: Option<CallbackMetadata>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
pub struct CallbackMetadata {
    #[serde(default)]
    pub item: Vec<CallbackItem>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
pub struct CallbackItem {
    pub name: String,
    #[serde(default)]
    pub value: Option<JsonValue>,
}

impl StkCallback {
    /// Receipt number the provider attaches to successful payments.
    pub fn receipt_number(&self) -> Option<String> {
        self.callback_metadata
            .as_ref()?
            .item
            .iter()
            .find(|i| i.name == "MpesaReceiptNumber")
            .and_then(|i| i.value.as_ref())
            .and_then(|v| v.as_str().map(str::to_string))
    }
}

/// Acknowledgement returned to the provider for every callback.
#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct CallbackAck {
    pub result_code: i64,
    pub result_desc: String,
}

impl CallbackAck {
    pub fn accepted() -> Self {
        Self {
            result_code: 0,
            result_desc: "Accepted".to_string(),
        }
    }
}
