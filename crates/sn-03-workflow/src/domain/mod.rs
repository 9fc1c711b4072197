//! Pure workflow rules.

pub mod admission;
pub mod creation;
pub mod derived;

pub use admission::{check_can_post, check_membership_target, check_prev_events};
pub use creation::{check_creation_events, check_user_stream_owner, CreationShape, Inception};
pub use derived::{channel_created, creator_joined, membership_mirror, DerivedWrite};
