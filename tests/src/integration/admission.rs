//! Causal admission, kind gating and creation guards through the service.

use super::harness::{on_both_backends, TestNode, Wallet};
use node_runtime::StreamServiceApi;
use shared_crypto::make_events;
use shared_types::{CreateStreamRequest, ErrorCode, InceptionData, Payload, StreamKind};
use sn_01_event_store::EventStoreKind;

on_both_backends! {
    non_tip_reference_admitted => non_tip_reference_admitted;
    unknown_references_refused => unknown_references_refused;
    messages_only_in_channels => messages_only_in_channels;
    repeat_creation_refused => repeat_creation_refused;
    foreign_user_stream_refused => foreign_user_stream_refused;
}

async fn non_tip_reference_admitted(kind: EventStoreKind) {
    let node = TestNode::open(kind);
    let bob = Wallet::new();
    bob.create_user(&node).await;
    bob.create_space(&node, "spc-a").await;
    let channel = bob.create_channel(&node, "spc-a", "chn-a").await;

    let first = bob.message("one", vec![channel[1].hash.clone()]);
    node.add("chn-a", &first).await.unwrap();

    // Both chained off the inception: a fork, tolerated.
    let fork_a = bob.message("fork a", vec![channel[0].hash.clone()]);
    let fork_b = bob.message("fork b", vec![channel[0].hash.clone()]);
    node.add("chn-a", &fork_a).await.unwrap();
    node.add("chn-a", &fork_b).await.unwrap();

    let mut leaves = node.leaves("chn-a").await;
    leaves.sort();
    let mut expected = vec![first.hash, fork_a.hash, fork_b.hash];
    expected.sort();
    assert_eq!(leaves, expected);

    // Merging the tips yields a single head again.
    let merge = bob.message("merge", node.leaves("chn-a").await);
    node.add("chn-a", &merge).await.unwrap();
    assert_eq!(node.leaves("chn-a").await, vec![merge.hash]);
}

async fn unknown_references_refused(kind: EventStoreKind) {
    let node = TestNode::open(kind);
    let bob = Wallet::new();
    bob.create_user(&node).await;
    let space = bob.create_space(&node, "spc-a").await;
    let channel = bob.create_channel(&node, "spc-a", "chn-a").await;
    let before = node.stream("chn-a").await.events.len();

    let empty = bob.message("x", vec![]);
    let other_stream = bob.message("x", vec![space[1].hash.clone()]);
    let half_known = bob.message("x", vec![channel[1].hash.clone(), space[1].hash.clone()]);

    for event in [&empty, &other_stream, &half_known] {
        let err = node.add("chn-a", event).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::BadPrevEvents);
    }
    assert_eq!(node.stream("chn-a").await.events.len(), before);
}

async fn messages_only_in_channels(kind: EventStoreKind) {
    let node = TestNode::open(kind);
    let bob = Wallet::new();
    bob.create_user(&node).await;
    bob.create_space(&node, "spc-a").await;

    let in_space = bob.message("x", node.leaves("spc-a").await);
    let err = node.add("spc-a", &in_space).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::BadEvent);

    let user_stream = bob.user_stream();
    let in_user = bob.message("x", node.leaves(&user_stream).await);
    let err = node.add(&user_stream, &in_user).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::BadEvent);

    let forged = bob.event(
        Payload::UserJoined {
            stream_id: "spc-a".into(),
            event_ref: "0x00".into(),
        },
        node.leaves(&user_stream).await,
    );
    let err = node.add(&user_stream, &forged).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::BadEvent);
}

async fn repeat_creation_refused(kind: EventStoreKind) {
    let node = TestNode::open(kind);
    let bob = Wallet::new();
    bob.create_user(&node).await;
    bob.create_space(&node, "spc-a").await;

    let again = make_events(
        &bob.signer,
        vec![
            Payload::Inception {
                stream_id: "spc-a".into(),
                data: InceptionData::new(StreamKind::Space),
            },
            Payload::Join {
                user_id: bob.address().to_string(),
            },
        ],
        vec![],
    )
    .unwrap();
    let err = node
        .service
        .create_space(CreateStreamRequest { events: again })
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::StreamAlreadyExists);
    assert_eq!(node.stream("spc-a").await.events.len(), 2);
}

async fn foreign_user_stream_refused(kind: EventStoreKind) {
    let node = TestNode::open(kind);
    let bob = Wallet::new();
    let mallory = Wallet::new();

    let events = make_events(
        &mallory.signer,
        vec![Payload::Inception {
            stream_id: bob.user_stream(),
            data: InceptionData::new(StreamKind::User),
        }],
        vec![],
    )
    .unwrap();
    let err = node
        .service
        .create_user(CreateStreamRequest { events })
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::BadStreamCreationParams);
}
