//! # Sync Properties
//!
//! Long-poll timing, multi-stream wake and append ordering observed
//! through `syncStreams`.

use super::harness::{on_both_backends, TestNode, Wallet};
use node_runtime::StreamServiceApi;
use shared_types::{SyncPos, SyncStreamsRequest};
use sn_01_event_store::EventStoreKind;
use std::time::{Duration, Instant};

on_both_backends! {
    empty_read_does_not_block => empty_read_does_not_block;
    empty_poll_waits_full_timeout => empty_poll_waits_full_timeout;
    wakes_on_any_stream => wakes_on_any_stream;
    read_your_writes => read_your_writes;
    append_order_preserved => append_order_preserved;
}

async fn bob_with_channels(node: &TestNode, channels: &[&str]) -> Wallet {
    let bob = Wallet::new();
    bob.create_user(node).await;
    bob.create_space(node, "spc-a").await;
    for id in channels {
        bob.create_channel(node, "spc-a", id).await;
    }
    bob
}

async fn empty_read_does_not_block(kind: EventStoreKind) {
    let node = TestNode::open(kind);
    bob_with_channels(&node, &["chn-a"]).await;
    let cookie = node.cookie("chn-a").await;

    let start = Instant::now();
    let got = node.sync(vec![SyncPos::new("chn-a", cookie)], 0).await;
    assert!(got.is_empty());
    assert!(start.elapsed() < Duration::from_millis(500));
}

async fn empty_poll_waits_full_timeout(kind: EventStoreKind) {
    let node = TestNode::open(kind);
    bob_with_channels(&node, &["chn-a"]).await;
    let cookie = node.cookie("chn-a").await;

    let start = Instant::now();
    let got = node.sync(vec![SyncPos::new("chn-a", cookie)], 300).await;
    assert!(got.is_empty());
    assert!(start.elapsed() >= Duration::from_millis(290));
}

async fn wakes_on_any_stream(kind: EventStoreKind) {
    let node = TestNode::open(kind);
    let ids = ["chn-1", "chn-2", "chn-3"];
    let bob = bob_with_channels(&node, &ids).await;

    let mut positions = Vec::new();
    for id in ids {
        positions.push(SyncPos::new(id, node.cookie(id).await));
    }

    let service = node.service.clone();
    let waiter = tokio::spawn(async move {
        let start = Instant::now();
        let resp = service
            .sync_streams(SyncStreamsRequest {
                sync_positions: positions,
                timeout_ms: 2_000,
            })
            .await;
        (resp, start.elapsed())
    });
    tokio::time::sleep(Duration::from_millis(150)).await;

    let msg = bob.message("ping", node.leaves("chn-2").await);
    node.add("chn-2", &msg).await.unwrap();

    let (resp, elapsed) = waiter.await.unwrap();
    let streams = resp.unwrap().streams;
    assert!(elapsed < Duration::from_millis(1_500), "woke after {elapsed:?}");
    assert_eq!(streams.keys().collect::<Vec<_>>(), vec!["chn-2"]);
    assert_eq!(streams["chn-2"].events, vec![msg]);
}

async fn read_your_writes(kind: EventStoreKind) {
    let node = TestNode::open(kind);
    let bob = bob_with_channels(&node, &["chn-a"]).await;
    let before = node.cookie("chn-a").await;

    let msg = bob.message("mine", node.leaves("chn-a").await);
    node.add("chn-a", &msg).await.unwrap();
    let after = node.cookie("chn-a").await;

    let got = node
        .sync(vec![SyncPos::new("chn-a", before.clone())], 0)
        .await;
    let stream = &got["chn-a"];
    assert_eq!(stream.events, vec![msg]);
    assert_eq!(stream.sync_cookie, after);
    assert_eq!(stream.original_sync_cookie.as_ref(), Some(&before));

    let caught_up = node.sync(vec![SyncPos::new("chn-a", after)], 0).await;
    assert!(caught_up.is_empty());
}

async fn append_order_preserved(kind: EventStoreKind) {
    let node = TestNode::open(kind);
    let bob = bob_with_channels(&node, &["chn-a"]).await;

    let mut cookies = vec![node.cookie("chn-a").await];
    let mut sent = Vec::new();
    for i in 0..5 {
        let msg = bob.message(&format!("m{i}"), node.leaves("chn-a").await);
        node.add("chn-a", &msg).await.unwrap();
        cookies.push(node.cookie("chn-a").await);
        sent.push(msg);
    }

    let stream = node.stream("chn-a").await;
    assert_eq!(&stream.events[2..], &sent[..]);

    // Every cookie is distinct and reading from the k-th yields the suffix.
    for (k, cookie) in cookies.iter().enumerate() {
        assert_eq!(cookies.iter().filter(|c| *c == cookie).count(), 1);
        let got = node
            .sync(vec![SyncPos::new("chn-a", cookie.clone())], 0)
            .await;
        match got.get("chn-a") {
            Some(tail) => assert_eq!(tail.events, sent[k..].to_vec()),
            None => assert_eq!(k, sent.len()),
        }
    }
}
