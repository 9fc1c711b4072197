//! Fixtures shared by the integration scenarios.

use node_runtime::{StreamNodeService, StreamServiceApi};
use shared_crypto::{make_event, make_events, SignerContext};
use shared_types::{
    make_user_stream_id, AddEventRequest, CreateStreamRequest, EventHash, FullEvent,
    GetEventStreamRequest, InceptionData, Payload, StreamAndCookie, StreamId, StreamKind,
    StreamResult, StreamsAndCookies, SyncCookie, SyncPos, SyncStreamsRequest,
};
use sn_01_event_store::{open_event_store, EventStoreKind, StoreSettings};
use sn_02_stream_state::find_leaf_event_hashes;
use sn_03_workflow::StreamWorkflow;
use std::sync::Arc;
use tempfile::TempDir;

/// Run an async scenario `fn(EventStoreKind)` once per backend.
macro_rules! on_both_backends {
    ($($name:ident => $scenario:ident;)+) => {
        $(
            mod $name {
                use sn_01_event_store::EventStoreKind;

                #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
                async fn log() {
                    super::$scenario(EventStoreKind::Log).await;
                }

                #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
                async fn native() {
                    super::$scenario(EventStoreKind::Native).await;
                }
            }
        )+
    };
}
pub(crate) use on_both_backends;

/// Long-poll ceiling used by test nodes.
pub const MAX_SYNC_MS: u64 = 5_000;

/// A node on a private store.
pub struct TestNode {
    pub service: Arc<StreamNodeService>,
    _dir: TempDir,
}

impl TestNode {
    pub fn open(kind: EventStoreKind) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = open_event_store(&StoreSettings::new(kind, dir.path().join("streams"))).unwrap();
        let workflow = StreamWorkflow::new(store, SignerContext::random());
        Self {
            service: Arc::new(StreamNodeService::new(workflow, MAX_SYNC_MS)),
            _dir: dir,
        }
    }

    pub async fn stream(&self, stream_id: &str) -> StreamAndCookie {
        self.service
            .get_event_stream(GetEventStreamRequest {
                stream_id: stream_id.to_string(),
            })
            .await
            .unwrap()
    }

    pub async fn leaves(&self, stream_id: &str) -> Vec<EventHash> {
        let stream = self.stream(stream_id).await;
        find_leaf_event_hashes(stream_id, &stream.events).unwrap()
    }

    pub async fn cookie(&self, stream_id: &str) -> SyncCookie {
        self.stream(stream_id).await.sync_cookie
    }

    pub async fn add(&self, stream_id: &str, event: &FullEvent) -> StreamResult<()> {
        self.service
            .add_event(AddEventRequest {
                stream_id: stream_id.to_string(),
                event: event.clone(),
            })
            .await
            .map(|_| ())
    }

    pub async fn sync(&self, positions: Vec<SyncPos>, timeout_ms: u64) -> StreamsAndCookies {
        self.service
            .sync_streams(SyncStreamsRequest {
                sync_positions: positions,
                timeout_ms,
            })
            .await
            .unwrap()
            .streams
    }
}

/// A client wallet.
pub struct Wallet {
    pub signer: SignerContext,
}

impl Wallet {
    pub fn new() -> Self {
        Self {
            signer: SignerContext::random(),
        }
    }

    pub fn address(&self) -> &str {
        self.signer.creator_address()
    }

    pub fn user_stream(&self) -> StreamId {
        make_user_stream_id(self.address())
    }

    pub fn event(&self, payload: Payload, prev: Vec<EventHash>) -> FullEvent {
        make_event(&self.signer, payload, prev).unwrap()
    }

    pub fn message(&self, text: &str, prev: Vec<EventHash>) -> FullEvent {
        self.event(
            Payload::Message {
                text: text.to_string(),
            },
            prev,
        )
    }

    pub fn join(&self, prev: Vec<EventHash>) -> FullEvent {
        self.event(
            Payload::Join {
                user_id: self.address().to_string(),
            },
            prev,
        )
    }

    fn creation(&self, stream_id: &str, data: InceptionData, with_join: bool) -> Vec<FullEvent> {
        let mut payloads = vec![Payload::Inception {
            stream_id: stream_id.to_string(),
            data,
        }];
        if with_join {
            payloads.push(Payload::Join {
                user_id: self.address().to_string(),
            });
        }
        make_events(&self.signer, payloads, vec![]).unwrap()
    }

    /// Create this wallet's user stream; returns its cookie.
    pub async fn create_user(&self, node: &TestNode) -> SyncCookie {
        let events = self.creation(&self.user_stream(), InceptionData::new(StreamKind::User), false);
        node.service
            .create_user(CreateStreamRequest { events })
            .await
            .unwrap()
            .sync_cookie
    }

    pub async fn create_space(&self, node: &TestNode, space_id: &str) -> Vec<FullEvent> {
        let events = self.creation(space_id, InceptionData::new(StreamKind::Space), true);
        node.service
            .create_space(CreateStreamRequest {
                events: events.clone(),
            })
            .await
            .unwrap();
        events
    }

    pub async fn create_channel(
        &self,
        node: &TestNode,
        space_id: &str,
        channel_id: &str,
    ) -> Vec<FullEvent> {
        let events = self.creation(channel_id, InceptionData::channel(space_id), true);
        node.service
            .create_channel(CreateStreamRequest {
                events: events.clone(),
            })
            .await
            .unwrap();
        events
    }
}

/// Payload kinds of `events`, in order.
pub fn kinds(events: &[FullEvent]) -> Vec<&'static str> {
    events.iter().map(|e| e.payload().kind()).collect()
}
