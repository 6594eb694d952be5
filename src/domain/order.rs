use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use utoipa::ToSchema;

/// Order primary key. The platform may hand it back as a number or a uuid string; both are
/// normalized to their string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, ToSchema)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for OrderId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = JsonValue::deserialize(deserializer)?;
        match value {
            JsonValue::String(s) => Ok(OrderId(s)),
            JsonValue::Number(n) => Ok(OrderId(n.to_string())),
            other => Err(serde::de::Error::custom(format!(
                "order id must be a string or number, got {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Failed,
    #[default]
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    /// Missing or null statuses read as `Unknown`.
    fn deserialize_nullable<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Option::<OrderStatus>::deserialize(deserializer)?.unwrap_or(OrderStatus::Unknown))
    }
}

/// A row of the platform's `orders` table, as far as this service reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: OrderId,
    #[serde(default, deserialize_with = "OrderStatus::deserialize_nullable")]
    pub status: OrderStatus,
    #[serde(default, alias = "total")]
    pub total_amount: Option<f64>,
    /// Set once the payment is confirmed.
    #[serde(default)]
    pub mpesa_code: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Last time the row changed, falling back to creation time.
    pub fn changed_at(&self) -> DateTime<Utc> {
        self.updated_at.unwrap_or(self.created_at)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderEventKind {
    Insert,
    Update,
}

/// One change-feed delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderEvent {
    pub kind: OrderEventKind,
    pub order: Order,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn order_rows_parse_with_numeric_ids_and_unknown_status() {
        let order: Order = serde_json::from_value(json!({
            "id": 42,
            "status": "awaiting_pickup",
            "total": 2500,
            "mpesa_code": null,
            "created_at": "2024-05-01T10:00:00.123456+00:00",
            "customer_name": "ignored"
        }))
        .unwrap();

        assert_eq!(order.id, OrderId("42".to_string()));
        assert_eq!(order.status, OrderStatus::Unknown);
        assert_eq!(order.total_amount, Some(2500.0));
        assert_eq!(order.mpesa_code, None);
        assert_eq!(order.changed_at(), order.created_at);
    }

    #[test]
    fn null_status_and_total_do_not_reject_the_row() {
        let order: Order = serde_json::from_value(json!({
            "id": "b1",
            "status": null,
            "total_amount": null,
            "created_at": "2024-05-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(order.status, OrderStatus::Unknown);
        assert_eq!(order.total_amount, None);

        let bare: Order = serde_json::from_value(json!({
            "id": 3,
            "created_at": "2024-05-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(bare.status, OrderStatus::Unknown);
    }

    #[test]
    fn order_id_rejects_non_scalar_values() {
        let parsed: Result<OrderId, _> = serde_json::from_value(json!({"id": 1}));
        assert!(parsed.is_err());
    }
}
