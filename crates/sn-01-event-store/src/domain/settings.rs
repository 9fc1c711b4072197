//! Backend selection and store settings.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Default number of pooled long-poll listeners (Backend A).
pub const DEFAULT_LISTENER_POOL_SIZE: usize = 8;

/// Default number of pooled blocking-read connections (Backend B).
pub const DEFAULT_READER_POOL_SIZE: usize = 4;

/// Default COUNT for native blocking reads.
pub const DEFAULT_READ_COUNT: usize = 100;

/// Which backend implements the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventStoreKind {
    /// One append-only table per stream, LISTEN/NOTIFY long polls.
    Log,
    /// One native append-log per stream, blocking multi-key reads.
    Native,
}

/// Unrecognized backend name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown event store backend '{0}' (expected 'log' or 'native')")]
pub struct UnknownStoreKind(pub String);

impl FromStr for EventStoreKind {
    type Err = UnknownStoreKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "log" | "postgres" | "pg" => Ok(EventStoreKind::Log),
            "native" | "redis" => Ok(EventStoreKind::Native),
            other => Err(UnknownStoreKind(other.to_string())),
        }
    }
}

impl fmt::Display for EventStoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventStoreKind::Log => write!(f, "log"),
            EventStoreKind::Native => write!(f, "native"),
        }
    }
}

/// Everything needed to open a store.
#[derive(Debug, Clone)]
pub struct StoreSettings {
    /// Backend to open.
    pub kind: EventStoreKind,
    /// Root directory of Backend A's tables.
    pub data_dir: PathBuf,
    /// Backend A: concurrent long polls.
    pub listener_pool_size: usize,
    /// Backend B: concurrent blocking reads.
    pub reader_pool_size: usize,
    /// Backend B: COUNT passed to blocking reads.
    pub read_count: usize,
}

impl StoreSettings {
    /// Settings for `kind` with defaults elsewhere.
    #[must_use]
    pub fn new(kind: EventStoreKind, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            kind: EventStoreKind::Log,
            data_dir: PathBuf::from("./data/streams"),
            listener_pool_size: DEFAULT_LISTENER_POOL_SIZE,
            reader_pool_size: DEFAULT_READER_POOL_SIZE,
            read_count: DEFAULT_READ_COUNT,
        }
    }
}
