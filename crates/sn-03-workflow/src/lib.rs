//! # Stream Workflow (sn-03)
//!
//! Write-side rules of the node: stream creation, causal admission of
//! client events and the server-signed derived events that mirror them.
//!
//! ## Operation Flow
//!
//! ```text
//! createUser     check ─→ create usr-<addr>
//! createSpace    check ─→ create spc-*  ─→ user-joined    → usr-<creator>
//! createChannel  check ─→ create chn-*  ─→ channel-created → spc-<parent>
//!                                       ─→ user-joined    → usr-<creator>
//! addEvent       check_event ─→ rollup ─→ prev events ─→ dispatch
//!                  join / invite / leave ─→ append ─→ user-* → usr-<target>
//!                  message               ─→ channel member? ─→ append
//!                  inception, derived    ─→ BAD_EVENT
//! ```
//!
//! ## Crate Structure
//!
//! - `domain/` - Pure checks and derived payload builders
//! - `ports/` - `StreamWorkflowApi`
//! - `service.rs` - `StreamWorkflow`, the store-backed implementation

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{CreationShape, DerivedWrite};
pub use ports::StreamWorkflowApi;
pub use service::StreamWorkflow;
