//! # Stream-Node Runtime
//!
//! Entry point of a stream node.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration from the environment
//! 2. Install the global tracing subscriber
//! 3. Validate configuration and open the event store
//! 4. Build the workflow and service facade
//! 5. Run until Ctrl+C, then close the store (pending long polls return
//!    empty)

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::FmtSubscriber;

use node_runtime::container::{load_config, NodeConfig, ServiceContainer};

/// A running node.
struct NodeRuntime {
    container: Arc<ServiceContainer>,
}

impl NodeRuntime {
    fn new(config: NodeConfig) -> Result<Self> {
        info!("Creating stream node runtime");
        let container = ServiceContainer::new(config).context("Failed to build node")?;
        Ok(Self {
            container: Arc::new(container),
        })
    }

    fn start(&self) {
        let config = &self.container.config;
        info!("===========================================");
        info!("  Stream-Node Runtime v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");
        info!("Backend: {}", config.storage.backend);
        info!("Data Dir: {:?}", config.storage.data_dir);
        info!("Max sync timeout: {} ms", config.sync.max_timeout_ms);
        info!(
            "Server address: {}",
            self.container.service.workflow().server_address()
        );
    }

    async fn shutdown(&self) {
        info!("Initiating graceful shutdown...");
        self.container.service.close().await;
        info!("Shutdown complete");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.level())
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let runtime = NodeRuntime::new(config)?;
    runtime.start();

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    runtime.shutdown().await;
    Ok(())
}
