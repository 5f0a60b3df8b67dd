use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::{
    errors::{ClassifyError, PushChannelError},
    merge::{parse_timestamp, AliasTable, OrderPatch},
    notifications::NotificationPayload,
    orders::{OrderId, OrderSide},
    shop::{RoutingFlags, ShopStatus},
};

//--------------------------------------       ChannelId       ---------------------------------------------------------
/// The two independent push channels the client listens on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelId {
    #[serde(rename = "notifications")]
    Notifications,
    #[serde(rename = "admin-chat")]
    AdminChat,
}

impl ChannelId {
    pub const ALL: [ChannelId; 2] = [ChannelId::Notifications, ChannelId::AdminChat];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelId::Notifications => "notifications",
            ChannelId::AdminChat => "admin-chat",
        }
    }
}

impl Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelId {
    type Err = PushChannelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "notifications" => Ok(Self::Notifications),
            "admin-chat" => Ok(Self::AdminChat),
            s => Err(PushChannelError::UnknownChannel(s.to_string())),
        }
    }
}

//--------------------------------------     InboundFrame      ---------------------------------------------------------
/// A raw message as handed over by a push transport.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundFrame {
    pub channel: ChannelId,
    /// The transport-level event name, e.g. `notification` or `chat:message`.
    pub event: String,
    pub payload: Value,
    pub received_at: DateTime<Utc>,
}

impl InboundFrame {
    pub fn new<S: Into<String>>(channel: ChannelId, event: S, payload: Value) -> Self {
        Self { channel, event: event.into(), payload, received_at: Utc::now() }
    }
}

//--------------------------------------     PushEnvelope      ---------------------------------------------------------
/// The body of every push event.
///
/// Only `type` is required. The optional text fields also accept numbers, so an unusual `id` or `createdAt` never
/// costs the whole event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushEnvelope {
    /// `domain:action` discriminator, e.g. `order:status`.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl PushEnvelope {
    pub fn from_frame(frame: &InboundFrame) -> Result<Self, ClassifyError> {
        if !frame.payload.is_object() {
            return Err(ClassifyError::Malformed(format!("{} payload is not an object", frame.event)));
        }
        let envelope = serde_json::from_value::<PushEnvelope>(frame.payload.clone())
            .map_err(|e| ClassifyError::Malformed(e.to_string()))?;
        if envelope.kind.trim().is_empty() {
            return Err(ClassifyError::MissingType);
        }
        Ok(envelope)
    }

    /// The time the server says the event happened, if it said so in a form we understand: ISO 8601 or epoch
    /// milliseconds.
    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.created_at.as_deref()?;
        parse_timestamp(raw)
            .or_else(|| raw.trim().parse::<i64>().ok().and_then(|ms| Utc.timestamp_millis_opt(ms).single()))
    }

    /// [`Self::sent_at`], or `fallback` if the server didn't say.
    pub fn occurred_at(&self, fallback: DateTime<Utc>) -> DateTime<Utc> {
        self.sent_at().unwrap_or(fallback)
    }

    pub fn to_notification(&self, at: DateTime<Utc>) -> NotificationPayload {
        NotificationPayload {
            id: self.id.clone(),
            title: self.title.clone(),
            content: self.content.clone(),
            kind: self.kind.clone(),
            metadata: self.metadata.clone().unwrap_or_default(),
            created_at: Some(self.occurred_at(at)),
        }
    }
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

//--------------------------------------       PushEvent       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderEventKind {
    /// `order:new`: a new order has arrived at the user's shop.
    Created,
    /// `order:placed`: the user's own order went through.
    Placed,
    /// `order:status`: an order changed status.
    StatusChanged,
    /// `order:customer:update`: the customer edited an order placed at the user's shop.
    CustomerUpdate,
}

impl OrderEventKind {
    pub fn from_type(kind: &str) -> Option<Self> {
        match kind {
            "order:new" => Some(Self::Created),
            "order:placed" => Some(Self::Placed),
            "order:status" => Some(Self::StatusChanged),
            "order:customer:update" => Some(Self::CustomerUpdate),
            _ => None,
        }
    }

    /// The order caches this kind of event is folded into.
    pub fn sides(&self) -> &'static [OrderSide] {
        match self {
            OrderEventKind::Created | OrderEventKind::CustomerUpdate => &[OrderSide::Shop],
            OrderEventKind::Placed => &[OrderSide::Buyer],
            OrderEventKind::StatusChanged => &[OrderSide::Buyer, OrderSide::Shop],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderEvent {
    pub kind: OrderEventKind,
    pub order_id: OrderId,
    pub metadata: Map<String, Value>,
    /// Stamped once per event, so re-applying the same event yields the same record.
    pub occurred_at: DateTime<Utc>,
    /// The envelope's own `createdAt`, when it carried a usable one.
    pub sent_at: Option<DateTime<Utc>>,
}

impl OrderEvent {
    /// Reads the event metadata through `aliases`.
    ///
    /// When the metadata has no `updatedAt`, the envelope's `createdAt` dates the patch instead, so an event that
    /// arrives late is recognised as stale rather than overwriting newer state.
    pub fn patch(&self, aliases: &AliasTable) -> OrderPatch {
        let mut patch = aliases.resolve(&self.metadata);
        patch.updated_at = patch.updated_at.or(self.sent_at);
        patch
    }
}

/// A push event, classified by its `type` discriminator into the closed set of shapes the engine acts on.
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    Order(OrderEvent),
    /// Any `shop:*` event. The payload is never trusted; it only signals that the authoritative status is stale.
    ShopChanged { action: String },
    /// Anything arriving on the admin chat channel.
    Chat,
    /// Any other notification. It only ever reaches the feed.
    Notice,
}

impl PushEvent {
    pub fn classify(
        channel: ChannelId,
        envelope: &PushEnvelope,
        received_at: DateTime<Utc>,
    ) -> Result<Self, ClassifyError> {
        if channel == ChannelId::AdminChat {
            return Ok(Self::Chat);
        }
        let kind = envelope.kind.trim();
        if let Some(action) = kind.strip_prefix("shop:") {
            return Ok(Self::ShopChanged { action: action.to_string() });
        }
        let Some(order_kind) = OrderEventKind::from_type(kind) else {
            return Ok(Self::Notice);
        };
        let metadata = envelope.metadata.clone().unwrap_or_default();
        let side = order_kind.sides()[0];
        let order_id = AliasTable::for_side(side)
            .order_id(&metadata)
            .ok_or_else(|| ClassifyError::MissingOrderId(kind.to_string()))?;
        Ok(Self::Order(OrderEvent {
            kind: order_kind,
            order_id,
            metadata,
            occurred_at: envelope.occurred_at(received_at),
            sent_at: envelope.sent_at(),
        }))
    }
}

//--------------------------------------      Hook events      ---------------------------------------------------------
/// Published whenever an authoritative refresh moves the shop to a different lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleChangedEvent {
    pub previous: Option<ShopStatus>,
    pub current: ShopStatus,
    pub routing: RoutingFlags,
}

/// Published once per failed authoritative refresh, so the host can show a transient warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshFailedEvent {
    pub reason: String,
    pub failed_at: DateTime<Utc>,
}
