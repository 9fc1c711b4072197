//! # Ports
//!
//! - `event_store` - the driven port implemented by every backend

pub mod event_store;

pub use event_store::EventStore;
