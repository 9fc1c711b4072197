//! # Domain
//!
//! Backend-independent pieces: the connection pool, backend selection and
//! the read-result helpers.

pub mod pool;
pub mod reads;
pub mod settings;

pub use pool::{ConnectionPool, PooledConnection, Recycle};
pub use settings::{
    EventStoreKind, StoreSettings, UnknownStoreKind, DEFAULT_LISTENER_POOL_SIZE,
    DEFAULT_READER_POOL_SIZE, DEFAULT_READ_COUNT,
};
