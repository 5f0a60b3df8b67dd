use std::collections::{HashSet, VecDeque};

use chrono::{DateTime, Utc};
use log::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::traits::Paginated;

pub const DEFAULT_FEED_CAPACITY: usize = 50;

//--------------------------------------     Notification      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Category in `domain:action` form, e.g. `order:status`.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// The part of `kind` before the first `:`.
    pub fn domain(&self) -> &str {
        self.kind.split(':').next().unwrap_or_default()
    }
}

/// An inbound notification before it has been admitted to the feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationPayload {
    pub id: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub kind: String,
    pub metadata: Map<String, Value>,
    pub created_at: Option<DateTime<Utc>>,
}

impl NotificationPayload {
    /// The identifier the server assigned to this notification, if any. `metadata.notificationId` takes priority over
    /// `metadata.id`, which takes priority over the envelope id.
    pub fn resolved_id(&self) -> Option<String> {
        ["notificationId", "id"]
            .iter()
            .find_map(|key| match self.metadata.get(*key) {
                Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            })
            .or_else(|| self.id.clone().filter(|s| !s.is_empty()))
    }
}

fn generate_id() -> String {
    format!("local-{:016x}", rand::random::<u64>())
}

//--------------------------------------   NotificationFeed    ---------------------------------------------------------
/// A bounded, newest-first list of notifications.
///
/// When the feed is full, the oldest entries are dropped without ceremony. Entries that fall off the end are gone for
/// good; only a fresh page fetch can bring them back.
#[derive(Debug, Clone)]
pub struct NotificationFeed {
    capacity: usize,
    items: VecDeque<Notification>,
}

impl Default for NotificationFeed {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CAPACITY)
    }
}

impl NotificationFeed {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { capacity, items: VecDeque::with_capacity(capacity) }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Admits a notification to the head of the feed and returns the stored entry.
    ///
    /// A payload whose id is already in the feed is a duplicate delivery; the existing entry is returned unchanged.
    pub fn push(&mut self, payload: NotificationPayload) -> Notification {
        let id = payload.resolved_id();
        if let Some(existing) = id.as_deref().and_then(|id| self.get(id)) {
            debug!("🔔️ Notification {} already in the feed", existing.id);
            return existing.clone();
        }
        let notification = Notification {
            id: id.unwrap_or_else(generate_id),
            title: payload.title,
            content: payload.content,
            kind: payload.kind,
            metadata: payload.metadata,
            is_read: false,
            created_at: payload.created_at.unwrap_or_else(Utc::now),
        };
        trace!("🔔️ New {} notification {}", notification.kind, notification.id);
        self.items.push_front(notification.clone());
        self.truncate();
        notification
    }

    /// Seeds the feed from the paged notification query. The first page replaces the feed; later pages append entries
    /// that are not already present. Returns the number of entries added.
    pub fn load_page(&mut self, page: Paginated<Notification>) -> usize {
        let Paginated { items, pagination } = page;
        if pagination.is_first_page() {
            self.items.clear();
        }
        let mut seen = self.items.iter().map(|n| n.id.clone()).collect::<HashSet<_>>();
        let before = self.items.len();
        self.items.extend(items.into_iter().filter(|n| seen.insert(n.id.clone())));
        self.truncate();
        self.items.len().saturating_sub(before)
    }

    /// Returns true if the notification exists.
    pub fn mark_read(&mut self, id: &str) -> bool {
        match self.items.iter_mut().find(|n| n.id == id) {
            Some(n) => {
                n.is_read = true;
                true
            },
            None => false,
        }
    }

    /// Returns the number of entries that flipped from unread to read.
    pub fn mark_all_read(&mut self) -> usize {
        self.items.iter_mut().filter(|n| !n.is_read).fold(0, |count, n| {
            n.is_read = true;
            count + 1
        })
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn unread_count(&self) -> usize {
        self.items.iter().filter(|n| !n.is_read).count()
    }

    pub fn get(&self, id: &str) -> Option<&Notification> {
        self.items.iter().find(|n| n.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn truncate(&mut self) {
        if self.items.len() > self.capacity {
            let dropped = self.items.len() - self.capacity;
            self.items.truncate(self.capacity);
            trace!("🔔️ Dropped {dropped} old notifications");
        }
    }
}
