//! # Service Container
//!
//! Builds the node from its configuration: store, server signer, workflow
//! and service facade, in that order.

pub mod config;
pub mod services;

pub use config::{load_config, load_config_from, ConfigError, NodeConfig};
pub use services::{ContainerError, ServiceContainer};
