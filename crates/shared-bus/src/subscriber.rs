//! # Listener
//!
//! Defines the listening side of the bus.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::debug;

/// A notification published on a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Channel the notification was published on.
    pub channel: String,
    /// Free-form payload.
    pub payload: String,
}

/// Errors from listener operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The bus was dropped.
    #[error("Notification bus closed")]
    Closed,

    /// Notifications were dropped because this listener fell behind.
    #[error("Listener lagged, {0} notifications dropped")]
    Lagged(u64),
}

/// A listener handle, comparable to one database connection in LISTEN mode.
///
/// When dropped, every registered channel is unlistened.
pub struct Listener {
    /// The broadcast receiver.
    receiver: broadcast::Receiver<Notification>,

    /// Channels this listener is registered on.
    channels: HashSet<String>,

    /// Reference to listener tracking (for cleanup).
    listen_counts: Arc<RwLock<HashMap<String, usize>>>,
}

impl Listener {
    pub(crate) fn new(
        receiver: broadcast::Receiver<Notification>,
        listen_counts: Arc<RwLock<HashMap<String, usize>>>,
    ) -> Self {
        Self {
            receiver,
            channels: HashSet::new(),
            listen_counts,
        }
    }

    /// Register on `channel`. Listening twice is a no-op.
    pub fn listen(&mut self, channel: &str) {
        if !self.channels.insert(channel.to_string()) {
            return;
        }
        if let Ok(mut counts) = self.listen_counts.write() {
            *counts.entry(channel.to_string()).or_insert(0) += 1;
        }
        debug!(channel = channel, "LISTEN");
    }

    /// Unregister from `channel`.
    pub fn unlisten(&mut self, channel: &str) {
        if self.channels.remove(channel) {
            self.release(channel);
        }
    }

    /// Unregister from every channel.
    pub fn unlisten_all(&mut self) {
        let channels: Vec<String> = self.channels.drain().collect();
        for channel in &channels {
            self.release(channel);
        }
    }

    /// Whether this listener is registered on `channel`.
    #[must_use]
    pub fn is_listening(&self, channel: &str) -> bool {
        self.channels.contains(channel)
    }

    /// Number of registered channels.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Receive the next notification on a registered channel.
    ///
    /// # Errors
    ///
    /// - `Closed` - the bus was dropped
    /// - `Lagged` - notifications were lost; the caller must re-check state
    pub async fn recv(&mut self) -> Result<Notification, SubscriptionError> {
        loop {
            let notification = match self.receiver.recv().await {
                Ok(n) => n,
                Err(broadcast::error::RecvError::Closed) => return Err(SubscriptionError::Closed),
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    debug!(lagged = count, "Listener lagged, some notifications dropped");
                    return Err(SubscriptionError::Lagged(count));
                }
            };

            if self.channels.contains(&notification.channel) {
                return Ok(notification);
            }
        }
    }

    /// Try to receive the next notification without blocking.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(n))` - A notification was available on a registered channel
    /// - `Ok(None)` - Nothing available (would block)
    pub fn try_recv(&mut self) -> Result<Option<Notification>, SubscriptionError> {
        loop {
            let notification = match self.receiver.try_recv() {
                Ok(n) => n,
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(SubscriptionError::Closed)
                }
                Err(broadcast::error::TryRecvError::Lagged(count)) => {
                    return Err(SubscriptionError::Lagged(count))
                }
            };

            if self.channels.contains(&notification.channel) {
                return Ok(Some(notification));
            }
        }
    }

    /// Discard everything buffered so far.
    ///
    /// Used before a pooled listener is handed to its next borrower.
    pub fn drain(&mut self) {
        self.receiver = self.receiver.resubscribe();
    }

    fn release(&self, channel: &str) {
        let Ok(mut counts) = self.listen_counts.write() else {
            return;
        };
        if let Some(count) = counts.get_mut(channel) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                counts.remove(channel);
            }
        }
        debug!(channel = channel, "UNLISTEN");
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.unlisten_all();
    }
}
