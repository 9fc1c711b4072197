//! Store, workflow and service wiring.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument};

use shared_types::StreamError;
use sn_01_event_store::open_event_store;
use sn_03_workflow::StreamWorkflow;

use crate::container::config::{ConfigError, NodeConfig};
use crate::service::StreamNodeService;

/// Failure to assemble the node.
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("event store: {0}")]
    Store(#[from] StreamError),
}

/// Owns every long-lived component of a node.
pub struct ServiceContainer {
    /// Configuration the container was built from.
    pub config: NodeConfig,
    /// Service facade (owns the workflow and, through it, the store).
    pub service: Arc<StreamNodeService>,
}

impl ServiceContainer {
    /// Validate `config` and open everything.
    ///
    /// # Errors
    ///
    /// Invalid configuration, or the store cannot be opened (for the log
    /// backend: directory not creatable or already locked).
    #[instrument(skip(config), fields(backend = %config.storage.backend))]
    pub fn new(config: NodeConfig) -> Result<Self, ContainerError> {
        config.validate()?;

        let settings = config.storage.settings()?;
        let store = open_event_store(&settings)?;
        info!(kind = %store.kind(), data_dir = ?settings.data_dir, "Event store opened");

        let signer = config.server.signer()?;
        let workflow = StreamWorkflow::new(store, signer);
        let service = Arc::new(StreamNodeService::new(
            workflow,
            config.sync.max_timeout_ms,
        ));

        Ok(Self { config, service })
    }
}
