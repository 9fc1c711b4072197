//! # Shared Types Crate
//!
//! Domain entities, sync positions, service payloads and the error taxonomy
//! shared by every Stream-Node crate.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: cross-crate types are defined here only.
//! - **Wire Compatibility**: all types serialize as camelCase JSON; payloads
//!   are tagged by `kind`.
//! - **Closed Payloads**: `Payload` is a closed enum, so every dispatch site
//!   must handle every kind.

pub mod api;
pub mod entities;
pub mod errors;
pub mod ids;
pub mod sync;

pub use api::*;
pub use entities::*;
pub use errors::*;
pub use ids::*;
pub use sync::*;
