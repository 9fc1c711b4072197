//! # Stream Creation Rules
//!
//! Shape checks on the event list submitted to `createUser`,
//! `createSpace` and `createChannel`. Store-dependent checks (existence,
//! parent space) live in the service.

use shared_types::{
    is_valid_stream_id, make_user_stream_id, FullEvent, InceptionData, Payload, StreamError,
    StreamId, StreamKind, StreamResult,
};

/// Expected layout of a creation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreationShape {
    /// Kind the inception must declare.
    pub kind: StreamKind,
    /// Kind of the mandatory second event, if any.
    pub extra_kind: Option<&'static str>,
}

impl CreationShape {
    /// User stream: inception only.
    pub const USER: Self = Self {
        kind: StreamKind::User,
        extra_kind: None,
    };

    /// Space: inception plus the creator's self-join.
    pub const SPACE: Self = Self {
        kind: StreamKind::Space,
        extra_kind: Some("join"),
    };

    /// Channel: inception plus the creator's self-join.
    pub const CHANNEL: Self = Self {
        kind: StreamKind::Channel,
        extra_kind: Some("join"),
    };

    fn expected_len(&self) -> usize {
        1 + usize::from(self.extra_kind.is_some())
    }
}

/// Validated creation request.
#[derive(Debug, Clone, Copy)]
pub struct Inception<'a> {
    pub stream_id: &'a StreamId,
    pub data: &'a InceptionData,
    pub event: &'a FullEvent,
}

/// Check the creation event list against `shape`.
///
/// # Errors
///
/// - `BAD_STREAM_CREATION_PARAMS` on an empty list, a non-inception first
///   event, a kind mismatch, a wrong event count, a mismatched second event
///   or a join by anyone but the creator
/// - `BAD_STREAM_ID` if the declared stream id is malformed
pub fn check_creation_events<'a>(
    events: &'a [FullEvent],
    shape: CreationShape,
) -> StreamResult<Inception<'a>> {
    let Some(first) = events.first() else {
        return Err(StreamError::bad_creation("no events"));
    };
    let Payload::Inception { stream_id, data } = first.payload() else {
        return Err(StreamError::bad_creation(format!(
            "first event is {}, expected inception",
            first.payload().kind()
        )));
    };
    if data.stream_kind != shape.kind {
        return Err(StreamError::bad_creation(format!(
            "stream kind is {}, expected {}",
            data.stream_kind, shape.kind
        )));
    }
    if events.len() != shape.expected_len() {
        return Err(StreamError::bad_creation(format!(
            "expected {} events, got {}",
            shape.expected_len(),
            events.len()
        )));
    }
    if !is_valid_stream_id(stream_id) {
        return Err(StreamError::BadStreamId {
            stream_id: stream_id.clone(),
        });
    }

    if let (Some(expected), Some(second)) = (shape.extra_kind, events.get(1)) {
        let payload = second.payload();
        if payload.kind() != expected {
            return Err(StreamError::bad_creation(format!(
                "second event is {}, expected {}",
                payload.kind(),
                expected
            )));
        }
        if !same_address(second.creator(), first.creator()) {
            return Err(StreamError::bad_creation(
                "second event creator differs from inception creator",
            ));
        }
        if let Payload::Join { user_id } = payload {
            if !same_address(user_id, first.creator()) {
                return Err(StreamError::bad_creation(
                    "only the creator may join at creation",
                ));
            }
        }
    }

    Ok(Inception {
        stream_id,
        data,
        event: first,
    })
}

/// User streams must live at the id derived from their creator.
///
/// # Errors
///
/// `BAD_STREAM_CREATION_PARAMS` on mismatch.
pub fn check_user_stream_owner(inception: &Inception<'_>) -> StreamResult<()> {
    let expected = make_user_stream_id(inception.event.creator());
    if *inception.stream_id != expected {
        return Err(StreamError::bad_creation(format!(
            "user stream id {} does not match creator (expected {})",
            inception.stream_id, expected
        )));
    }
    Ok(())
}

fn same_address(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_crypto::{make_events, SignerContext};
    use shared_types::ErrorCode;

    fn inception(stream_id: &str, data: InceptionData) -> Payload {
        Payload::Inception {
            stream_id: stream_id.to_string(),
            data,
        }
    }

    fn join(user: &str) -> Payload {
        Payload::Join {
            user_id: user.to_string(),
        }
    }

    fn code(events: &[FullEvent], shape: CreationShape) -> ErrorCode {
        check_creation_events(events, shape).unwrap_err().code()
    }

    #[test]
    fn test_valid_space() {
        let bob = SignerContext::random();
        let events = make_events(
            &bob,
            vec![
                inception("spc-bob", InceptionData::new(StreamKind::Space)),
                join(bob.creator_address()),
            ],
            vec![],
        )
        .unwrap();

        let checked = check_creation_events(&events, CreationShape::SPACE).unwrap();
        assert_eq!(checked.stream_id, "spc-bob");
        assert_eq!(checked.data.stream_kind, StreamKind::Space);
    }

    #[test]
    fn test_shape_violations() {
        let bob = SignerContext::random();
        let space = InceptionData::new(StreamKind::Space);

        assert_eq!(code(&[], CreationShape::USER), ErrorCode::BadStreamCreationParams);

        let only_join = make_events(&bob, vec![join(bob.creator_address())], vec![]).unwrap();
        assert_eq!(code(&only_join, CreationShape::SPACE), ErrorCode::BadStreamCreationParams);

        let wrong_kind = make_events(
            &bob,
            vec![inception("spc-a", space.clone()), join(bob.creator_address())],
            vec![],
        )
        .unwrap();
        assert_eq!(
            code(&wrong_kind, CreationShape::CHANNEL),
            ErrorCode::BadStreamCreationParams
        );

        let missing_join = make_events(&bob, vec![inception("spc-a", space.clone())], vec![]).unwrap();
        assert_eq!(
            code(&missing_join, CreationShape::SPACE),
            ErrorCode::BadStreamCreationParams
        );

        let wrong_second = make_events(
            &bob,
            vec![
                inception("spc-a", space.clone()),
                Payload::Message { text: "hi".into() },
            ],
            vec![],
        )
        .unwrap();
        assert_eq!(
            code(&wrong_second, CreationShape::SPACE),
            ErrorCode::BadStreamCreationParams
        );
    }

    #[test]
    fn test_join_must_be_creator() {
        let bob = SignerContext::random();
        let alice = SignerContext::random();
        let space = InceptionData::new(StreamKind::Space);

        let joins_other = make_events(
            &bob,
            vec![inception("spc-a", space.clone()), join(alice.creator_address())],
            vec![],
        )
        .unwrap();
        assert_eq!(
            code(&joins_other, CreationShape::SPACE),
            ErrorCode::BadStreamCreationParams
        );

        let mut signed_by_other =
            make_events(&bob, vec![inception("spc-a", space)], vec![]).unwrap();
        signed_by_other.extend(
            make_events(
                &alice,
                vec![join(alice.creator_address())],
                vec![signed_by_other[0].hash.clone()],
            )
            .unwrap(),
        );
        assert_eq!(
            code(&signed_by_other, CreationShape::SPACE),
            ErrorCode::BadStreamCreationParams
        );
    }

    #[test]
    fn test_bad_stream_id() {
        let bob = SignerContext::random();
        let events = make_events(
            &bob,
            vec![
                inception("room-1", InceptionData::new(StreamKind::Space)),
                join(bob.creator_address()),
            ],
            vec![],
        )
        .unwrap();
        assert_eq!(code(&events, CreationShape::SPACE), ErrorCode::BadStreamId);
    }

    #[test]
    fn test_user_stream_owner() {
        let bob = SignerContext::random();
        let own = make_user_stream_id(bob.creator_address());
        let events = make_events(
            &bob,
            vec![inception(&own, InceptionData::new(StreamKind::User))],
            vec![],
        )
        .unwrap();
        let checked = check_creation_events(&events, CreationShape::USER).unwrap();
        assert!(check_user_stream_owner(&checked).is_ok());

        let alice = SignerContext::random();
        let foreign = make_user_stream_id(alice.creator_address());
        let events = make_events(
            &bob,
            vec![inception(&foreign, InceptionData::new(StreamKind::User))],
            vec![],
        )
        .unwrap();
        let checked = check_creation_events(&events, CreationShape::USER).unwrap();
        assert_eq!(
            check_user_stream_owner(&checked).unwrap_err().code(),
            ErrorCode::BadStreamCreationParams
        );
    }
}
