//! Backend B: native append-logs with blocking multi-key reads.

pub mod connection;
pub mod engine;
pub mod store;

pub use connection::NativeConnection;
pub use engine::{EntryId, NativeEngine, StreamEntry};
pub use store::NativeStreamStore;
