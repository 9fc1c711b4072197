//! # Adapters Module
//!
//! Backend implementations of the `EventStore` port.
//!
//! ## Modules
//!
//! - `log`: Backend A, one table file per stream
//! - `native`: Backend B, in-process append-log engine
//! - `lock`: Data directory locking (singleton guard)

pub mod lock;
pub mod log;
pub mod native;

pub use lock::{DataDirLock, LockError};
pub use log::LogEventStore;
pub use native::NativeStreamStore;
