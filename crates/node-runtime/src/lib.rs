//! # Node Runtime Library
//!
//! Wiring of a stream node: configuration, the service facade and the JSON
//! method dispatcher. The `main.rs` binary is a thin wrapper around these.
//!
//! ## Modules
//!
//! - `container/` - Configuration and component assembly
//! - `service` - `StreamServiceApi` and `StreamNodeService`
//! - `rpc` - Method-name dispatch over JSON params

#![allow(clippy::module_name_repetitions)]

pub mod container;
pub mod rpc;
pub mod service;

pub use container::{load_config, ConfigError, NodeConfig, ServiceContainer};
pub use rpc::{dispatch, RpcError};
pub use service::{StreamNodeService, StreamServiceApi};
