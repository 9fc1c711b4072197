//! # Core Domain Entities
//!
//! Defines the event and stream entities shared by every subsystem.
//!
//! ## Clusters
//!
//! - **Events**: `FullEvent`, `BaseEvent`, `Payload`
//! - **Streams**: `StreamKind`, `InceptionData`
//!
//! Events travel as JSON with camelCase field names; payloads are tagged by
//! a `kind` field (`"inception"`, `"user-joined"`, ...).

use serde::{Deserialize, Serialize};

// =============================================================================
// PRIMITIVES
// =============================================================================

/// A Keccak-256 event hash, `0x`-prefixed lowercase hex (66 chars).
pub type EventHash = String;

/// A 20-byte Ethereum-style wallet address, `0x`-prefixed lowercase hex.
pub type Address = String;

/// Opaque stream identifier (see [`crate::ids`]).
pub type StreamId = String;

/// Opaque, backend-defined position marker inside one stream.
pub type SyncCookie = String;

// =============================================================================
// STREAMS
// =============================================================================

/// The kind of a stream, fixed by its inception event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    /// Personal stream of one wallet address.
    User,
    /// A space: container of channels.
    Space,
    /// A channel inside a space; the only kind that accepts messages.
    Channel,
}

impl std::fmt::Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamKind::User => write!(f, "user"),
            StreamKind::Space => write!(f, "space"),
            StreamKind::Channel => write!(f, "channel"),
        }
    }
}

/// Data carried by an inception payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InceptionData {
    /// Kind of the stream being created.
    pub stream_kind: StreamKind,
    /// Parent space. Required for channels, absent otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_id: Option<StreamId>,
}

impl InceptionData {
    /// Inception data for a stream without a parent.
    #[must_use]
    pub fn new(stream_kind: StreamKind) -> Self {
        Self {
            stream_kind,
            space_id: None,
        }
    }

    /// Inception data for a channel under `space_id`.
    #[must_use]
    pub fn channel(space_id: impl Into<StreamId>) -> Self {
        Self {
            stream_kind: StreamKind::Channel,
            space_id: Some(space_id.into()),
        }
    }
}

// =============================================================================
// EVENTS
// =============================================================================

/// Event payload.
///
/// Client-submitted kinds: `inception`, `join`, `invite`, `leave`, `message`.
/// Server-derived kinds: `user-invited`, `user-joined`, `user-left`,
/// `channel-created`, `channel-deleted`. Derived kinds are only ever signed
/// by the node itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "kind",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum Payload {
    /// First event of every stream.
    Inception {
        stream_id: StreamId,
        data: InceptionData,
    },
    /// `user_id` joins the stream.
    Join { user_id: Address },
    /// `user_id` is invited to the stream.
    Invite { user_id: Address },
    /// `user_id` leaves the stream.
    Leave { user_id: Address },
    /// A chat message.
    Message { text: String },
    /// Mirrors an `invite` into the invitee's user stream.
    UserInvited {
        stream_id: StreamId,
        inviter_id: Address,
        event_ref: EventHash,
    },
    /// Mirrors a `join` into the joiner's user stream.
    UserJoined {
        stream_id: StreamId,
        event_ref: EventHash,
    },
    /// Mirrors a `leave` into the leaver's user stream.
    UserLeft {
        stream_id: StreamId,
        event_ref: EventHash,
    },
    /// Records a channel creation in its parent space.
    ChannelCreated {
        channel_id: StreamId,
        event_ref: EventHash,
    },
    /// Records a channel deletion in its parent space.
    ChannelDeleted {
        channel_id: StreamId,
        event_ref: EventHash,
    },
}

impl Payload {
    /// Wire name of the payload kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Inception { .. } => "inception",
            Payload::Join { .. } => "join",
            Payload::Invite { .. } => "invite",
            Payload::Leave { .. } => "leave",
            Payload::Message { .. } => "message",
            Payload::UserInvited { .. } => "user-invited",
            Payload::UserJoined { .. } => "user-joined",
            Payload::UserLeft { .. } => "user-left",
            Payload::ChannelCreated { .. } => "channel-created",
            Payload::ChannelDeleted { .. } => "channel-deleted",
        }
    }

    /// Whether this kind may only be produced by the node.
    #[must_use]
    pub fn is_derived(&self) -> bool {
        matches!(
            self,
            Payload::UserInvited { .. }
                | Payload::UserJoined { .. }
                | Payload::UserLeft { .. }
                | Payload::ChannelCreated { .. }
                | Payload::ChannelDeleted { .. }
        )
    }
}

/// The hashed and signed part of an event.
///
/// Field order is the canonical hashing order; do not reorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseEvent {
    /// Address of the signer.
    pub creator_address: Address,
    /// Random nonce, makes otherwise identical events distinct.
    pub salt: String,
    /// Causal predecessors inside the same stream.
    pub prev_events: Vec<EventHash>,
    /// Typed content.
    pub payload: Payload,
}

/// An immutable, hash-identified, signed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullEvent {
    /// Keccak-256 of the canonical encoding of `base`.
    pub hash: EventHash,
    /// Recoverable secp256k1 signature over `hash` (65 bytes, hex).
    pub signature: String,
    /// Signed content.
    pub base: BaseEvent,
}

impl FullEvent {
    /// Creator of the event.
    #[must_use]
    pub fn creator(&self) -> &str {
        &self.base.creator_address
    }

    /// Payload of the event.
    #[must_use]
    pub fn payload(&self) -> &Payload {
        &self.base.payload
    }

    /// Causal predecessors of the event.
    #[must_use]
    pub fn prev_events(&self) -> &[EventHash] {
        &self.base.prev_events
    }
}
