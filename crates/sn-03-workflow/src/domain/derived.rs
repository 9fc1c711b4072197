//! Server-derived payloads.

use shared_types::{
    make_user_stream_id, FullEvent, Payload, StreamError, StreamId, StreamResult,
};

/// A derived payload and the stream it goes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedWrite {
    pub target: StreamId,
    pub payload: Payload,
}

/// Mirror of a `join` / `invite` / `leave` landed in `stream_id`, bound for
/// the affected user's own stream.
///
/// # Errors
///
/// `INTERNAL_ERROR_SWITCH` for any other kind; dispatch never routes them
/// here.
pub fn membership_mirror(stream_id: &str, event: &FullEvent) -> StreamResult<DerivedWrite> {
    let event_ref = event.hash.clone();
    let stream_id = stream_id.to_string();
    let (user_id, payload) = match event.payload() {
        Payload::Join { user_id } => (user_id, Payload::UserJoined { stream_id, event_ref }),
        Payload::Invite { user_id } => (
            user_id,
            Payload::UserInvited {
                stream_id,
                inviter_id: event.creator().to_string(),
                event_ref,
            },
        ),
        Payload::Leave { user_id } => (user_id, Payload::UserLeft { stream_id, event_ref }),
        other @ (Payload::Inception { .. }
        | Payload::Message { .. }
        | Payload::UserInvited { .. }
        | Payload::UserJoined { .. }
        | Payload::UserLeft { .. }
        | Payload::ChannelCreated { .. }
        | Payload::ChannelDeleted { .. }) => {
            return Err(StreamError::InternalErrorSwitch {
                case: other.kind().to_string(),
            })
        }
    };
    Ok(DerivedWrite {
        target: make_user_stream_id(user_id),
        payload,
    })
}

/// `user-joined` for the creator of a new space or channel.
#[must_use]
pub fn creator_joined(stream_id: &str, join: &FullEvent) -> DerivedWrite {
    DerivedWrite {
        target: make_user_stream_id(join.creator()),
        payload: Payload::UserJoined {
            stream_id: stream_id.to_string(),
            event_ref: join.hash.clone(),
        },
    }
}

/// `channel-created` for the parent space of a new channel.
#[must_use]
pub fn channel_created(space_id: &str, channel_id: &str, inception: &FullEvent) -> DerivedWrite {
    DerivedWrite {
        target: space_id.to_string(),
        payload: Payload::ChannelCreated {
            channel_id: channel_id.to_string(),
            event_ref: inception.hash.clone(),
        },
    }
}
