//! # Node Configuration
//!
//! Storage backend, long-poll limits and the server signing identity.
//!
//! ## Environment Overrides
//!
//! | Variable | Field |
//! |----------|-------|
//! | `SN_STORAGE_BACKEND` | `storage.backend` (`log`, `native`, `postgres`, `pg`, `redis`) |
//! | `SN_DATA_DIR` | `storage.data_dir` |
//! | `SN_LISTENER_POOL_SIZE` | `storage.listener_pool_size` |
//! | `SN_READER_POOL_SIZE` | `storage.reader_pool_size` |
//! | `SN_MAX_SYNC_TIMEOUT_MS` | `sync.max_timeout_ms` |
//! | `SN_SERVER_KEY` | `server.signing_key` (64 hex chars) |
//! | `SN_LOG_LEVEL` | `log_level` |
//!
//! Unparseable values are logged and ignored.

use shared_crypto::{CryptoError, SignerContext};
use sn_01_event_store::{
    EventStoreKind, StoreSettings, DEFAULT_LISTENER_POOL_SIZE, DEFAULT_READER_POOL_SIZE,
    DEFAULT_READ_COUNT,
};
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use tracing::{info, warn, Level};

/// Complete node configuration.
#[derive(Debug, Clone, Default)]
pub struct NodeConfig {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Long-poll configuration.
    pub sync: SyncConfig,
    /// Server identity.
    pub server: ServerConfig,
    /// Log level name, parsed by `tracing::Level`.
    pub log_level: Option<String>,
}

impl NodeConfig {
    /// Check the configuration before anything is opened.
    ///
    /// # Errors
    ///
    /// Unknown backend, zero pool sizes or a malformed signing key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.storage.kind()?;
        if self.storage.listener_pool_size == 0 {
            return Err(ConfigError::ZeroPoolSize("listener_pool_size"));
        }
        if self.storage.reader_pool_size == 0 {
            return Err(ConfigError::ZeroPoolSize("reader_pool_size"));
        }
        if self.storage.read_count == 0 {
            return Err(ConfigError::ZeroPoolSize("read_count"));
        }
        self.server.signer()?;
        Ok(())
    }

    /// Level for the global subscriber, `INFO` when unset or invalid.
    #[must_use]
    pub fn level(&self) -> Level {
        self.log_level
            .as_deref()
            .and_then(|name| Level::from_str(name).ok())
            .unwrap_or(Level::INFO)
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Backend name is not one of the known kinds.
    #[error("unknown storage backend: {0}")]
    UnknownBackend(String),

    /// A pool or batch size is zero.
    #[error("{0} must be greater than zero")]
    ZeroPoolSize(&'static str),

    /// Server signing key cannot be parsed.
    #[error("invalid server signing key: {0}")]
    InvalidServerKey(#[from] CryptoError),
}

/// Storage configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Backend name.
    pub backend: String,
    /// Root directory of the log backend.
    pub data_dir: PathBuf,
    /// LISTEN connections for long polls (log backend).
    pub listener_pool_size: usize,
    /// Blocking reader connections (native backend).
    pub reader_pool_size: usize,
    /// COUNT of a blocking native read.
    pub read_count: usize,
}

impl StorageConfig {
    /// Backend kind named by `backend`.
    ///
    /// # Errors
    ///
    /// `UnknownBackend` if the name is not recognized.
    pub fn kind(&self) -> Result<EventStoreKind, ConfigError> {
        self.backend
            .parse()
            .map_err(|_| ConfigError::UnknownBackend(self.backend.clone()))
    }

    /// Store settings for `open_event_store`.
    ///
    /// # Errors
    ///
    /// `UnknownBackend` if the name is not recognized.
    pub fn settings(&self) -> Result<StoreSettings, ConfigError> {
        Ok(StoreSettings {
            kind: self.kind()?,
            data_dir: self.data_dir.clone(),
            listener_pool_size: self.listener_pool_size,
            reader_pool_size: self.reader_pool_size,
            read_count: self.read_count,
        })
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: EventStoreKind::Log.to_string(),
            data_dir: PathBuf::from("./data/streams"),
            listener_pool_size: DEFAULT_LISTENER_POOL_SIZE,
            reader_pool_size: DEFAULT_READER_POOL_SIZE,
            read_count: DEFAULT_READ_COUNT,
        }
    }
}

/// Long-poll configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Upper bound applied to client `timeoutMs`.
    pub max_timeout_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_timeout_ms: 30_000,
        }
    }
}

/// Server identity configuration.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    /// Hex secret key signing derived events. Random per process when unset.
    pub signing_key: Option<String>,
}

impl ServerConfig {
    /// Signer for derived events.
    ///
    /// # Errors
    ///
    /// `InvalidServerKey` if the configured key is malformed.
    pub fn signer(&self) -> Result<SignerContext, ConfigError> {
        match self.signing_key.as_deref() {
            Some(key) => Ok(SignerContext::from_secret_hex(key)?),
            None => Ok(SignerContext::random()),
        }
    }
}

/// Load configuration from the process environment.
pub fn load_config() -> NodeConfig {
    load_config_from(|name| std::env::var(name).ok())
}

/// Load configuration from `lookup`, starting from defaults.
pub fn load_config_from(lookup: impl Fn(&str) -> Option<String>) -> NodeConfig {
    let mut config = NodeConfig::default();

    if let Some(backend) = lookup("SN_STORAGE_BACKEND") {
        if backend.parse::<EventStoreKind>().is_ok() {
            config.storage.backend = backend;
        } else {
            warn!(value = %backend, "SN_STORAGE_BACKEND not recognized, keeping default");
        }
    }
    if let Some(dir) = lookup("SN_DATA_DIR") {
        config.storage.data_dir = PathBuf::from(dir);
    }
    override_parsed(&lookup, "SN_LISTENER_POOL_SIZE", &mut config.storage.listener_pool_size);
    override_parsed(&lookup, "SN_READER_POOL_SIZE", &mut config.storage.reader_pool_size);
    override_parsed(&lookup, "SN_MAX_SYNC_TIMEOUT_MS", &mut config.sync.max_timeout_ms);

    if let Some(key) = lookup("SN_SERVER_KEY") {
        if key.trim_start_matches("0x").len() == 64 {
            config.server.signing_key = Some(key);
            info!("Loaded server signing key from environment");
        } else {
            warn!("SN_SERVER_KEY must be 32 bytes (64 hex chars)");
        }
    }
    if let Some(level) = lookup("SN_LOG_LEVEL") {
        config.log_level = Some(level);
    }

    config
}

fn override_parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    slot: &mut T,
) {
    let Some(raw) = lookup(name) else {
        return;
    };
    match raw.parse() {
        Ok(value) => *slot = value,
        Err(_) => warn!(variable = name, value = %raw, "Ignoring unparseable value"),
    }
}
