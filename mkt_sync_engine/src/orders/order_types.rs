use std::{convert::Infallible, fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use mkt_common::Amount;
use serde::{Deserialize, Serialize};

//--------------------------------------        OrderId        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------      OrderStatus      ---------------------------------------------------------
/// Order status as reported by the marketplace.
///
/// The buyer-side vocabulary is closed, but shops report a few statuses of their own. Those are kept verbatim in
/// [`OrderStatus::Other`] so that nothing the server said is lost in translation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    /// The order has been placed but not yet acknowledged by the shop.
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    /// The order has been cancelled by the buyer, the shop or an admin.
    Cancelled,
    Other(String),
}

impl OrderStatus {
    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Other(s) => s.as_str(),
        }
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for OrderStatus {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Self::Pending,
            "confirmed" => Self::Confirmed,
            "processing" => Self::Processing,
            "shipped" | "shipping" => Self::Shipped,
            "delivered" => Self::Delivered,
            "cancelled" | "canceled" => Self::Cancelled,
            _ => Self::Other(value.trim().to_string()),
        }
    }
}

impl From<String> for OrderStatus {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<OrderStatus> for String {
    fn from(value: OrderStatus) -> Self {
        match value {
            OrderStatus::Other(s) => s,
            s => s.as_str().to_string(),
        }
    }
}

//--------------------------------------       OrderSide       ---------------------------------------------------------
/// Which of the two order caches a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderSide {
    /// Orders the current user placed as a customer.
    Buyer,
    /// Orders placed against the current user's shop.
    Shop,
}

impl Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderSide::Buyer => write!(f, "buyer"),
            OrderSide::Shop => write!(f, "shop"),
        }
    }
}

//--------------------------------------      OrderRecord      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    #[serde(rename = "_id")]
    pub id: OrderId,
    #[serde(rename = "orderStatus", alias = "status")]
    pub status: OrderStatus,
    #[serde(default)]
    pub subtotal: Amount,
    #[serde(default)]
    pub shipping_fee: Amount,
    #[serde(default, alias = "discountAmount")]
    pub discount: Amount,
    #[serde(default)]
    pub total_amount: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "note")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderRecord {
    /// A bare record with every optional field empty and every amount zero.
    pub fn new(id: OrderId, status: OrderStatus, at: DateTime<Utc>) -> Self {
        Self {
            id,
            status,
            subtotal: Amount::ZERO,
            shipping_fee: Amount::ZERO,
            discount: Amount::ZERO,
            total_amount: Amount::ZERO,
            tracking_number: None,
            notes: None,
            created_at: at,
            updated_at: at,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn status_parsing_is_lenient() {
        assert_eq!(OrderStatus::from("Shipped"), OrderStatus::Shipped);
        assert_eq!(OrderStatus::from("canceled"), OrderStatus::Cancelled);
        assert_eq!(OrderStatus::from("ready_to_ship"), OrderStatus::Other("ready_to_ship".into()));
        assert_eq!(String::from(OrderStatus::Other("returned".into())), "returned");
    }

    #[test]
    fn record_serializes_with_wire_names() {
        let at = DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z").unwrap().with_timezone(&Utc);
        let mut record = OrderRecord::new("o1".into(), OrderStatus::Shipped, at);
        record.tracking_number = Some("VN1".into());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["_id"], "o1");
        assert_eq!(json["orderStatus"], "shipped");
        assert_eq!(json["trackingNumber"], "VN1");
        assert_eq!(json["totalAmount"], 0);
        assert!(json.get("notes").is_none());
    }

    #[test]
    fn record_accepts_buyer_field_names() {
        let json = r#"{"_id":"b7","status":"delivered","discountAmount":500,"note":"leave at door",
            "createdAt":"2024-05-01T10:00:00Z","updatedAt":"2024-05-02T10:00:00Z"}"#;
        let record: OrderRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.status, OrderStatus::Delivered);
        assert_eq!(record.discount.value(), 500);
        assert_eq!(record.notes.as_deref(), Some("leave at door"));
    }
}
