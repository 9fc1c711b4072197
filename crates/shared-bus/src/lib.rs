//! # Shared Bus - Channel Notifications
//!
//! In-process LISTEN/NOTIFY. Writers publish a short payload on a named
//! channel; listeners register interest in any number of channels and
//! receive only the notifications published on those.
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │   Writer     │                    │  Long poll   │
//! │              │    notify()        │              │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │     Bus      │          │
//!                  │              │ ─────────┘
//!                  └──────────────┘  listen() / recv()
//! ```
//!
//! ## Delivery
//!
//! - A notification published after `listen(channel)` returns is delivered.
//! - A listener that falls more than the channel capacity behind observes
//!   [`SubscriptionError::Lagged`] and must re-check its sources.
//! - Dropping a [`Listener`] unlistens every channel it held.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use publisher::{InMemoryNotificationBus, NotificationPublisher};
pub use subscriber::{Listener, Notification, SubscriptionError};

/// Maximum notifications to buffer per listener before it lags.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacity() {
        assert_eq!(DEFAULT_CHANNEL_CAPACITY, 1000);
    }
}
