//! # Stream-Node Test Suite
//!
//! Cross-crate scenarios driven through the service facade, each run
//! against both event store backends.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── harness.rs      # Node + wallet fixtures
//!     ├── scenarios.rs    # End-to-end user journeys
//!     ├── admission.rs    # Causal admission and kind gating
//!     └── sync.rs         # Long-poll and ordering properties
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p sn-tests
//! cargo test -p sn-tests integration::sync::
//! ```

pub mod integration;
