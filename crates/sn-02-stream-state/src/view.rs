//! # Stream State View
//!
//! Replay-derived summary of one stream. Never stored; rebuilt per request
//! by [`crate::rollup_stream`].

use serde::Serialize;
use shared_types::{Address, EventHash, StreamId, StreamKind};
use std::collections::{BTreeSet, HashSet};

/// Current state of a stream.
///
/// Addresses are kept lowercase; lookups normalize their argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamStateView {
    pub stream_id: StreamId,
    pub stream_kind: StreamKind,
    /// Creator of the inception event (the owner, for user streams).
    pub creator_address: Address,
    /// Parent space, channels only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub space_id: Option<StreamId>,

    /// Members, from `join` / `leave` (and the owner via `user-joined`).
    pub joined_users: BTreeSet<Address>,
    /// Invited but not necessarily joined.
    pub invited_users: BTreeSet<Address>,
    /// Every event hash seen, for causal admission.
    #[serde(skip)]
    pub events: HashSet<EventHash>,

    /// User streams: streams this user joined.
    pub user_joined_streams: BTreeSet<StreamId>,
    /// User streams: streams this user was invited to.
    pub user_invited_streams: BTreeSet<StreamId>,
    /// Space streams: live channels.
    pub space_channels: BTreeSet<StreamId>,
}

impl StreamStateView {
    pub(crate) fn new(
        stream_id: StreamId,
        stream_kind: StreamKind,
        creator_address: Address,
        space_id: Option<StreamId>,
    ) -> Self {
        Self {
            stream_id,
            stream_kind,
            creator_address: creator_address.to_ascii_lowercase(),
            space_id,
            joined_users: BTreeSet::new(),
            invited_users: BTreeSet::new(),
            events: HashSet::new(),
            user_joined_streams: BTreeSet::new(),
            user_invited_streams: BTreeSet::new(),
            space_channels: BTreeSet::new(),
        }
    }

    /// Whether `hash` is part of this stream.
    #[must_use]
    pub fn has_event(&self, hash: &str) -> bool {
        self.events.contains(hash)
    }

    /// Whether `address` is currently a member.
    #[must_use]
    pub fn is_joined(&self, address: &str) -> bool {
        self.joined_users.contains(&address.to_ascii_lowercase())
    }

    /// Whether `address` has an outstanding invite.
    #[must_use]
    pub fn is_invited(&self, address: &str) -> bool {
        self.invited_users.contains(&address.to_ascii_lowercase())
    }

    /// Number of events replayed.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events.len()
    }
}
