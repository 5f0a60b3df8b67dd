use chrono::{DateTime, TimeZone, Utc};
use log::*;
use mkt_common::Amount;
use serde_json::{Map, Value};

use crate::orders::{OrderId, OrderSide, OrderStatus};

/// The metadata keys that may carry each order field, in priority order. The first key that is present with a usable
/// value wins.
///
/// Buyer-side and shop-side events describe the same concepts with slightly different names, so each side gets its own
/// table. Both tables check every known spelling; they only disagree on which spelling is preferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AliasTable {
    pub order_id: &'static [&'static str],
    pub status: &'static [&'static str],
    pub subtotal: &'static [&'static str],
    pub shipping_fee: &'static [&'static str],
    pub discount: &'static [&'static str],
    pub total_amount: &'static [&'static str],
    pub tracking_number: &'static [&'static str],
    pub notes: &'static [&'static str],
    pub created_at: &'static [&'static str],
    pub updated_at: &'static [&'static str],
}

impl AliasTable {
    pub const BUYER: AliasTable = AliasTable {
        order_id: &["orderId", "order_id"],
        status: &["orderStatus", "status", "state"],
        subtotal: &["subtotal"],
        shipping_fee: &["shippingFee"],
        discount: &["discountAmount", "discount"],
        total_amount: &["totalAmount", "total"],
        tracking_number: &["trackingNumber"],
        notes: &["note", "notes"],
        created_at: &["createdAt"],
        updated_at: &["updatedAt"],
    };
    pub const SHOP: AliasTable = AliasTable {
        order_id: &["orderId", "order_id"],
        status: &["orderStatus", "status", "state"],
        subtotal: &["subtotal"],
        shipping_fee: &["shippingFee"],
        discount: &["discount", "discountAmount"],
        total_amount: &["totalAmount", "total"],
        tracking_number: &["trackingNumber"],
        notes: &["notes", "note"],
        created_at: &["createdAt"],
        updated_at: &["updatedAt"],
    };

    pub fn for_side(side: OrderSide) -> &'static AliasTable {
        match side {
            OrderSide::Buyer => &Self::BUYER,
            OrderSide::Shop => &Self::SHOP,
        }
    }

    /// Extracts the order identifier from event metadata. Numeric identifiers are accepted and stringified.
    pub fn order_id(&self, metadata: &Map<String, Value>) -> Option<OrderId> {
        first_of(metadata, self.order_id, as_text).filter(|s| !s.is_empty()).map(OrderId::from)
    }

    /// Resolves raw event metadata into a typed patch. Keys that are missing, `null` or of an unusable type are left
    /// as `None`, so they can never overwrite an existing value.
    pub fn resolve(&self, metadata: &Map<String, Value>) -> OrderPatch {
        OrderPatch {
            status: first_of(metadata, self.status, as_text).filter(|s| !s.is_empty()).map(OrderStatus::from),
            subtotal: first_of(metadata, self.subtotal, as_amount),
            shipping_fee: first_of(metadata, self.shipping_fee, as_amount),
            discount: first_of(metadata, self.discount, as_amount),
            total_amount: first_of(metadata, self.total_amount, as_amount),
            tracking_number: first_of(metadata, self.tracking_number, as_text),
            notes: first_of(metadata, self.notes, as_text),
            created_at: first_of(metadata, self.created_at, as_timestamp),
            updated_at: first_of(metadata, self.updated_at, as_timestamp),
        }
    }
}

/// A partial order update. `None` means "not provided", never "clear this field".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderPatch {
    pub status: Option<OrderStatus>,
    pub subtotal: Option<Amount>,
    pub shipping_fee: Option<Amount>,
    pub discount: Option<Amount>,
    pub total_amount: Option<Amount>,
    pub tracking_number: Option<String>,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl OrderPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

fn first_of<T>(metadata: &Map<String, Value>, keys: &[&str], convert: fn(&str, &Value) -> Option<T>) -> Option<T> {
    keys.iter().find_map(|key| metadata.get(*key).and_then(|v| convert(key, v)))
}

fn as_text(_key: &str, value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_amount(key: &str, value: &Value) -> Option<Amount> {
    let result = match value {
        Value::Null => return None,
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => Amount::try_from(i),
            (None, Some(u), _) => Amount::try_from(u),
            (None, None, Some(f)) => Amount::try_from(f),
            _ => return None,
        },
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(f) => Amount::try_from(f),
            Err(_) => {
                debug!("📦️ Ignoring non-numeric value for {key}: {s}");
                return None;
            },
        },
        _ => return None,
    };
    result.map_err(|e| debug!("📦️ Ignoring value for {key}. {e}")).ok()
}

fn as_timestamp(key: &str, value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp(s).or_else(|| {
            debug!("📦️ Ignoring unparseable timestamp for {key}: {s}");
            None
        }),
        Value::Number(n) => n.as_i64().and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    }
}

/// Parses an ISO 8601 timestamp as found in push envelopes and order metadata.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim()).map(|dt| dt.with_timezone(&Utc)).ok()
}
