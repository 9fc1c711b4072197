//! # Stream Workflow Service
//!
//! Application service implementing [`StreamWorkflowApi`] over an
//! [`EventStore`].
//!
//! ## Two-write operations
//!
//! `createSpace`, `createChannel` and membership `addEvent` commit the
//! primary write first, then append one or two server-signed derived
//! events. There is no cross-stream transaction: if a derived write fails
//! the primary stays committed, the failure is logged at `error` and
//! returned to the caller.
//!
//! ## Concurrency
//!
//! Admission checks run against a replay taken before the append. Two
//! concurrent appends to one stream may both pass and fork the DAG; the
//! store's atomic append is the only serialization point.

use crate::domain::{
    channel_created, check_can_post, check_creation_events, check_membership_target,
    check_prev_events, check_user_stream_owner, creator_joined, membership_mirror, CreationShape,
    DerivedWrite, Inception,
};
use crate::ports::StreamWorkflowApi;
use async_trait::async_trait;
use shared_crypto::{check_event, make_event, CryptoError, SignerContext};
use shared_types::{
    is_valid_stream_id, Address, FullEvent, Payload, StreamError, StreamKind, StreamResult,
    SyncCookie,
};
use sn_01_event_store::EventStore;
use sn_02_stream_state::{find_leaf_event_hashes, rollup_stream, StreamStateView};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Workflow layer over one event store.
///
/// Holds the server signer used for derived events.
pub struct StreamWorkflow {
    store: Arc<dyn EventStore>,
    signer: SignerContext,
}

impl StreamWorkflow {
    pub fn new(store: Arc<dyn EventStore>, signer: SignerContext) -> Self {
        info!(server = %signer.creator_address(), backend = %store.kind(), "Stream workflow ready");
        Self { store, signer }
    }

    pub fn store(&self) -> &Arc<dyn EventStore> {
        &self.store
    }

    /// Creator address of derived events.
    pub fn server_address(&self) -> &Address {
        self.signer.creator_address()
    }

    /// Shared pre-check of the three create operations.
    ///
    /// Every event must pass the structural check, the list must match
    /// `shape` and the stream must not exist yet.
    ///
    /// # Errors
    ///
    /// `BAD_EVENT_HASH`, `BAD_EVENT_SIGNATURE`, `BAD_STREAM_CREATION_PARAMS`,
    /// `BAD_STREAM_ID` or `STREAM_ALREADY_EXISTS`.
    pub async fn check_stream_creation_params<'a>(
        &self,
        events: &'a [FullEvent],
        shape: CreationShape,
    ) -> StreamResult<Inception<'a>> {
        for event in events {
            check_event(event)?;
        }
        let inception = check_creation_events(events, shape)?;
        if self.store.stream_exists(inception.stream_id).await {
            return Err(StreamError::already_exists(inception.stream_id.as_str()));
        }
        Ok(inception)
    }

    /// Load and replay `stream_id`.
    pub async fn rollup(&self, stream_id: &str) -> StreamResult<StreamStateView> {
        let stream = self.store.get_event_stream(stream_id).await?;
        rollup_stream(stream_id, &stream.events)
    }

    async fn check_parent_space(&self, space_id: &str) -> StreamResult<()> {
        let parent = match self.rollup(space_id).await {
            Ok(view) => view,
            Err(e) if e.is_not_found() => {
                return Err(StreamError::bad_creation(format!(
                    "parent space {} does not exist",
                    space_id
                )))
            }
            Err(e) => return Err(e),
        };
        if parent.stream_kind != StreamKind::Space {
            return Err(StreamError::bad_creation(format!(
                "parent {} is a {:?} stream, not a space",
                space_id, parent.stream_kind
            )));
        }
        Ok(())
    }

    async fn create_stream(&self, inception: &Inception<'_>, events: &[FullEvent]) -> StreamResult<SyncCookie> {
        let cookie = self
            .store
            .create_event_stream(inception.stream_id, events)
            .await?;
        info!(
            stream_id = %inception.stream_id,
            kind = %inception.data.stream_kind,
            creator = %inception.event.creator(),
            cookie = %cookie,
            "Stream created"
        );
        Ok(cookie)
    }

    /// Append a server-signed event chained off the target's current tips.
    async fn append_derived(&self, write: &DerivedWrite) -> StreamResult<SyncCookie> {
        let stream = self.store.get_event_stream(&write.target).await?;
        let leaves = find_leaf_event_hashes(&write.target, &stream.events)?;
        let event = make_event(&self.signer, write.payload.clone(), leaves).map_err(signing_error)?;
        self.store
            .add_events(&write.target, std::slice::from_ref(&event))
            .await
    }

    async fn mirror(&self, primary: &str, write: DerivedWrite) -> StreamResult<()> {
        match self.append_derived(&write).await {
            Ok(cookie) => {
                debug!(
                    primary = %primary,
                    target = %write.target,
                    kind = write.payload.kind(),
                    cookie = %cookie,
                    "Derived event appended"
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    primary = %primary,
                    target = %write.target,
                    kind = write.payload.kind(),
                    error = %err,
                    "Derived write failed after primary commit"
                );
                Err(err)
            }
        }
    }

    async fn add_membership_event(
        &self,
        view: &StreamStateView,
        event: &FullEvent,
    ) -> StreamResult<SyncCookie> {
        check_membership_target(view, event)?;
        let write = membership_mirror(&view.stream_id, event)?;

        let cookie = self
            .store
            .add_events(&view.stream_id, std::slice::from_ref(event))
            .await?;
        self.mirror(&view.stream_id, write).await?;
        Ok(cookie)
    }

    async fn add_message_event(
        &self,
        view: &StreamStateView,
        event: &FullEvent,
    ) -> StreamResult<SyncCookie> {
        check_can_post(view, event)?;
        self.store
            .add_events(&view.stream_id, std::slice::from_ref(event))
            .await
    }
}

#[async_trait]
impl StreamWorkflowApi for StreamWorkflow {
    async fn create_user(&self, events: &[FullEvent]) -> StreamResult<SyncCookie> {
        let inception = self
            .check_stream_creation_params(events, CreationShape::USER)
            .await?;
        check_user_stream_owner(&inception)?;
        self.create_stream(&inception, events).await
    }

    async fn create_space(&self, events: &[FullEvent]) -> StreamResult<SyncCookie> {
        let inception = self
            .check_stream_creation_params(events, CreationShape::SPACE)
            .await?;
        let cookie = self.create_stream(&inception, events).await?;

        // Shape check guarantees the self-join at index 1.
        let join = &events[1];
        self.mirror(inception.stream_id, creator_joined(inception.stream_id, join))
            .await?;
        Ok(cookie)
    }

    async fn create_channel(&self, events: &[FullEvent]) -> StreamResult<SyncCookie> {
        let inception = self
            .check_stream_creation_params(events, CreationShape::CHANNEL)
            .await?;
        let Some(space_id) = inception.data.space_id.as_deref() else {
            return Err(StreamError::bad_creation("channel inception has no spaceId"));
        };
        self.check_parent_space(space_id).await?;
        let cookie = self.create_stream(&inception, events).await?;

        let channel_id = inception.stream_id;
        self.mirror(channel_id, channel_created(space_id, channel_id, inception.event))
            .await?;
        self.mirror(channel_id, creator_joined(channel_id, &events[1]))
            .await?;
        Ok(cookie)
    }

    async fn add_event(&self, stream_id: &str, event: &FullEvent) -> StreamResult<SyncCookie> {
        check_event(event)?;
        if !is_valid_stream_id(stream_id) {
            return Err(StreamError::BadStreamId {
                stream_id: stream_id.to_string(),
            });
        }

        let view = self.rollup(stream_id).await?;
        check_prev_events(&view, event)?;
        debug!(
            stream_id = %stream_id,
            kind = event.payload().kind(),
            hash = %event.hash,
            "Admitting event"
        );

        match event.payload() {
            Payload::Inception { .. } => Err(StreamError::bad_event(
                "inception cannot be added after creation",
            )),
            Payload::UserInvited { .. }
            | Payload::UserJoined { .. }
            | Payload::UserLeft { .. }
            | Payload::ChannelCreated { .. }
            | Payload::ChannelDeleted { .. } => Err(StreamError::bad_event(format!(
                "{} is derived and cannot be submitted",
                event.payload().kind()
            ))),
            Payload::Join { .. } | Payload::Invite { .. } | Payload::Leave { .. } => {
                self.add_membership_event(&view, event).await
            }
            Payload::Message { .. } => self.add_message_event(&view, event).await,
        }
    }
}

fn signing_error(err: CryptoError) -> StreamError {
    StreamError::Storage(format!("signing derived event: {err}"))
}
