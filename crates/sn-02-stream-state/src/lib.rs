//! # Stream State (sn-02)
//!
//! Pure derivation of a stream's current state from its event list:
//!
//! - [`rollup_stream`] - kind, membership, seen hashes, per-kind extras
//! - [`find_leaf_event_hashes`] - current DAG tips, the `prev_events` of
//!   the next append
//!
//! Both are O(n) replays with no caching; callers fetch the full stream and
//! rebuild on every request.

pub mod leaves;
pub mod rollup;
pub mod view;

pub use leaves::find_leaf_event_hashes;
pub use rollup::rollup_stream;
pub use view::StreamStateView;
