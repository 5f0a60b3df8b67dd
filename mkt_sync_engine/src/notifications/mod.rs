//! The in-app notification feed.
mod feed;

pub use feed::{Notification, NotificationFeed, NotificationPayload, DEFAULT_FEED_CAPACITY};
