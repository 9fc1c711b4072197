//! # End-to-End Scenarios
//!
//! User journeys through the service facade: a single user building a
//! space, and two users meeting through an invite.

use super::harness::{kinds, on_both_backends, TestNode, Wallet};
use node_runtime::StreamServiceApi;
use shared_types::{ErrorCode, Payload, SyncPos, SyncStreamsRequest};
use sn_01_event_store::EventStoreKind;
use std::time::Duration;

on_both_backends! {
    bob_talks_to_himself => bob_talks_to_himself;
    bob_invites_alice => bob_invites_alice;
    alice_leaves => alice_leaves;
}

async fn bob_talks_to_himself(kind: EventStoreKind) {
    let node = TestNode::open(kind);
    let bob = Wallet::new();

    bob.create_user(&node).await;
    bob.create_space(&node, "spc-bobs").await;
    let channel = bob.create_channel(&node, "spc-bobs", "chn-general").await;
    let start = node.cookie("chn-general").await;

    let hello = bob.message("hello", vec![channel[1].hash.clone()]);
    node.add("chn-general", &hello).await.unwrap();

    let orphan = bob.message("lost", vec![]);
    let err = node.add("chn-general", &orphan).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::BadPrevEvents);

    let synced = node
        .sync(vec![SyncPos::new("chn-general", start.clone())], 0)
        .await;
    let got = &synced["chn-general"];
    assert_eq!(got.events, vec![hello]);
    assert_eq!(got.original_sync_cookie.as_deref(), Some(start.as_str()));

    let user = node.stream(&bob.user_stream()).await;
    assert_eq!(kinds(&user.events), ["inception", "user-joined", "user-joined"]);
    let space = node.stream("spc-bobs").await;
    assert_eq!(kinds(&space.events), ["inception", "join", "channel-created"]);
}

async fn bob_invites_alice(kind: EventStoreKind) {
    let node = TestNode::open(kind);
    let bob = Wallet::new();
    let alice = Wallet::new();

    bob.create_user(&node).await;
    let alice_cookie = alice.create_user(&node).await;
    bob.create_space(&node, "spc-bobs").await;
    bob.create_channel(&node, "spc-bobs", "chn-general").await;

    // Not a member yet.
    let early = alice.message("hi?", node.leaves("chn-general").await);
    let err = node.add("chn-general", &early).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::UserCantPost);

    // Alice parks on her user stream while Bob invites her.
    let waiter = {
        let service = node.service.clone();
        let pos = SyncPos::new(alice.user_stream(), alice_cookie);
        tokio::spawn(async move {
            service
                .sync_streams(SyncStreamsRequest {
                    sync_positions: vec![pos],
                    timeout_ms: 2_000,
                })
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    let invite = bob.event(
        Payload::Invite {
            user_id: alice.address().to_string(),
        },
        node.leaves("chn-general").await,
    );
    node.add("chn-general", &invite).await.unwrap();

    let woke = tokio::time::timeout(Duration::from_secs(3), waiter)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let mirrored = &woke.streams[&alice.user_stream()].events;
    assert_eq!(mirrored.len(), 1);
    assert_eq!(
        mirrored[0].payload(),
        &Payload::UserInvited {
            stream_id: "chn-general".into(),
            inviter_id: bob.address().to_string(),
            event_ref: invite.hash.clone(),
        }
    );

    let join = alice.join(node.leaves("chn-general").await);
    node.add("chn-general", &join).await.unwrap();
    let alice_stream = node.stream(&alice.user_stream()).await;
    assert_eq!(
        kinds(&alice_stream.events),
        ["inception", "user-invited", "user-joined"]
    );

    let hi = alice.message("hi bob", node.leaves("chn-general").await);
    node.add("chn-general", &hi).await.unwrap();
    let channel = node.stream("chn-general").await;
    assert_eq!(channel.events.last(), Some(&hi));
}

async fn alice_leaves(kind: EventStoreKind) {
    let node = TestNode::open(kind);
    let bob = Wallet::new();
    let alice = Wallet::new();

    bob.create_user(&node).await;
    alice.create_user(&node).await;
    bob.create_space(&node, "spc-bobs").await;
    bob.create_channel(&node, "spc-bobs", "chn-general").await;

    node.add("chn-general", &alice.join(node.leaves("chn-general").await))
        .await
        .unwrap();
    let leave = alice.event(
        Payload::Leave {
            user_id: alice.address().to_string(),
        },
        node.leaves("chn-general").await,
    );
    node.add("chn-general", &leave).await.unwrap();

    let bye = alice.message("still here?", node.leaves("chn-general").await);
    let err = node.add("chn-general", &bye).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::UserCantPost);

    let alice_stream = node.stream(&alice.user_stream()).await;
    assert_eq!(
        kinds(&alice_stream.events),
        ["inception", "user-joined", "user-left"]
    );
}
