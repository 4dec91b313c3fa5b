//! Change notification bus.
//!
//! After every successful remote mutation the engine publishes a
//! [`BookmarkFlow`] so other open views can refresh. Delivery is
//! fire-and-forget: publishing with no subscribers is fine, and a slow
//! subscriber that lags loses messages rather than blocking the engine.
//!
//! Subjects are dot-separated and subscriptions filter them with
//! NATS-style wildcards:
//! - `*` matches exactly one token: `bookmarks.*` matches `bookmarks.changed`
//! - `>` matches one or more trailing tokens: `>` matches everything
//!
//! ```ignore
//! let bus = FlowBus::<BookmarkFlow>::new(256);
//! let mut sub = bus.subscribe("bookmarks.*");
//! bus.publish(BookmarkFlow::changed(ChangeReason::Reorder));
//! let msg = sub.recv().await;
//! ```

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tokio::sync::broadcast;

use shiori_types::BookmarkId;

/// Check if a subject matches a pattern.
pub fn matches_pattern(pattern: &str, subject: &str) -> bool {
    let mut pattern_tokens = pattern.split('.').peekable();
    let mut subject_tokens = subject.split('.');

    while let Some(p) = pattern_tokens.next() {
        match (p, subject_tokens.next()) {
            // `>` only counts in last position, and needs at least one token
            (">", Some(_)) => return pattern_tokens.peek().is_none(),
            (_, None) => return false,
            ("*", Some(_)) => {}
            (token, Some(s)) if token == s => {}
            _ => return false,
        }
    }
    subject_tokens.next().is_none()
}

/// Payloads that know their subject.
pub trait HasSubject {
    fn subject(&self) -> &str;
}

/// A message published to the bus.
#[derive(Clone, Debug)]
pub struct FlowMessage<T> {
    pub subject: String,
    pub payload: T,
    pub timestamp: Instant,
}

impl<T: HasSubject> FlowMessage<T> {
    pub fn new(payload: T) -> Self {
        Self {
            subject: payload.subject().to_string(),
            payload,
            timestamp: Instant::now(),
        }
    }
}

// ============================================================================
// Bookmark events
// ============================================================================

/// What kind of mutation triggered a change notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChangeReason {
    Create,
    Move,
    Remove,
    Update,
    Reorder,
    Paste,
    /// The store was edited outside the engine.
    External,
}

/// Events published by the engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum BookmarkFlow {
    /// The remote tree changed; views should reload.
    BookmarksChanged {
        reason: ChangeReason,
        /// Folder whose children changed, when a single one did.
        parent_id: Option<BookmarkId>,
    },
    /// A new snapshot was persisted.
    SnapshotWritten { updated_at: DateTime<Utc> },
    /// Layout preferences were rewritten.
    LayoutChanged,
}

impl BookmarkFlow {
    pub fn changed(reason: ChangeReason) -> Self {
        Self::BookmarksChanged {
            reason,
            parent_id: None,
        }
    }

    pub fn changed_in(reason: ChangeReason, parent_id: BookmarkId) -> Self {
        Self::BookmarksChanged {
            reason,
            parent_id: Some(parent_id),
        }
    }
}

impl HasSubject for BookmarkFlow {
    fn subject(&self) -> &str {
        match self {
            Self::BookmarksChanged { .. } => "bookmarks.changed",
            Self::SnapshotWritten { .. } => "bookmarks.snapshot",
            Self::LayoutChanged => "layout.changed",
        }
    }
}

// ============================================================================
// Bus
// ============================================================================

/// Typed broadcast bus. Cheap to clone; clones share the channel.
#[derive(Debug)]
pub struct FlowBus<T: Clone + Send + 'static> {
    tx: broadcast::Sender<FlowMessage<T>>,
}

impl<T: Clone + Send + 'static> FlowBus<T> {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }
}

impl<T: Clone + Send + HasSubject + 'static> FlowBus<T> {
    /// Publish a payload. Returns how many subscribers were handed it.
    pub fn publish(&self, payload: T) -> usize {
        self.tx.send(FlowMessage::new(payload)).unwrap_or(0)
    }

    /// Subscribe to subjects matching `pattern`.
    pub fn subscribe(&self, pattern: &str) -> Subscription<T> {
        Subscription {
            pattern: pattern.to_string(),
            rx: self.tx.subscribe(),
        }
    }
}

impl<T: Clone + Send + 'static> Clone for FlowBus<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

/// A pattern-filtered subscription.
#[derive(Debug)]
pub struct Subscription<T: Clone> {
    pattern: String,
    rx: broadcast::Receiver<FlowMessage<T>>,
}

impl<T: Clone> Subscription<T> {
    /// Next matching message. `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<FlowMessage<T>> {
        loop {
            match self.rx.recv().await {
                Ok(msg) if matches_pattern(&self.pattern, &msg.subject) => return Some(msg),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(pattern = %self.pattern, lagged = n, "flow subscription lagged behind");
                }
            }
        }
    }

    /// Next matching message if one is already queued.
    pub fn try_recv(&mut self) -> Option<FlowMessage<T>> {
        loop {
            match self.rx.try_recv() {
                Ok(msg) if matches_pattern(&self.pattern, &msg.subject) => return Some(msg),
                Ok(_) => {}
                Err(broadcast::error::TryRecvError::Empty | broadcast::error::TryRecvError::Closed) => {
                    return None;
                }
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    tracing::warn!(pattern = %self.pattern, lagged = n, "flow subscription lagged behind");
                }
            }
        }
    }
}

/// The bus type the engine publishes on.
pub type BookmarkBus = FlowBus<BookmarkFlow>;
