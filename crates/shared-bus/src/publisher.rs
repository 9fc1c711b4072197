//! # Notification Publisher
//!
//! Defines the publishing side of the bus.

use crate::subscriber::{Listener, Notification};
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tracing::debug;

/// Trait for publishing notifications to the bus.
#[async_trait]
pub trait NotificationPublisher: Send + Sync {
    /// Publish `payload` on `channel`.
    ///
    /// # Returns
    ///
    /// The number of listeners currently registered on `channel`.
    async fn notify(&self, channel: &str, payload: &str) -> usize;

    /// Get the total number of notifications published.
    fn notifications_published(&self) -> u64;
}

/// In-memory implementation of the bus.
///
/// Uses `tokio::sync::broadcast` for multi-producer, multi-consumer
/// semantics; channel filtering happens on the listener side.
pub struct InMemoryNotificationBus {
    /// Broadcast sender for notifications.
    sender: broadcast::Sender<Notification>,

    /// Active listener count by channel.
    listen_counts: Arc<RwLock<HashMap<String, usize>>>,

    /// Total notifications published.
    published: AtomicU64,

    /// Channel capacity.
    capacity: usize,
}

impl InMemoryNotificationBus {
    /// Create a new bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new bus with specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            listen_counts: Arc::new(RwLock::new(HashMap::new())),
            published: AtomicU64::new(0),
            capacity,
        }
    }

    /// Open a listener with no channels registered.
    ///
    /// Notifications published from this point on are buffered for it.
    #[must_use]
    pub fn listener(&self) -> Listener {
        Listener::new(self.sender.subscribe(), self.listen_counts.clone())
    }

    /// Number of listeners registered on `channel`.
    #[must_use]
    pub fn listener_count(&self, channel: &str) -> usize {
        self.listen_counts
            .read()
            .ok()
            .and_then(|counts| counts.get(channel).copied())
            .unwrap_or(0)
    }

    /// Number of open listeners, registered on any channel or none.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Get the channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryNotificationBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationPublisher for InMemoryNotificationBus {
    async fn notify(&self, channel: &str, payload: &str) -> usize {
        self.published.fetch_add(1, Ordering::Relaxed);

        let interested = self.listener_count(channel);
        if interested == 0 {
            return 0;
        }

        let notification = Notification {
            channel: channel.to_string(),
            payload: payload.to_string(),
        };
        match self.sender.send(notification) {
            Ok(receivers) => {
                debug!(
                    channel = channel,
                    listeners = interested,
                    receivers = receivers,
                    "Notification published"
                );
                interested
            }
            Err(_) => 0,
        }
    }

    fn notifications_published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}
