//! # Stream Node Service
//!
//! The six request/response operations exposed to the transport layer.
//! Writes go through the workflow; reads go straight to the store.

use async_trait::async_trait;
use shared_types::{
    AddEventRequest, AddEventResponse, CreateStreamRequest, CreateStreamResponse,
    GetEventStreamRequest, StreamAndCookie, StreamResult, SyncStreamsRequest, SyncStreamsResponse,
};
use sn_01_event_store::EventStore;
use sn_03_workflow::{StreamWorkflow, StreamWorkflowApi};
use std::sync::Arc;
use tracing::{debug, info};

/// Request/response API of a stream node.
#[async_trait]
pub trait StreamServiceApi: Send + Sync {
    async fn create_user(&self, req: CreateStreamRequest) -> StreamResult<CreateStreamResponse>;

    async fn create_space(&self, req: CreateStreamRequest) -> StreamResult<CreateStreamResponse>;

    async fn create_channel(&self, req: CreateStreamRequest)
        -> StreamResult<CreateStreamResponse>;

    async fn add_event(&self, req: AddEventRequest) -> StreamResult<AddEventResponse>;

    async fn get_event_stream(&self, req: GetEventStreamRequest) -> StreamResult<StreamAndCookie>;

    /// Long poll. `timeout_ms` is clamped to the configured maximum.
    async fn sync_streams(&self, req: SyncStreamsRequest) -> StreamResult<SyncStreamsResponse>;
}

/// [`StreamServiceApi`] over one workflow and its store.
pub struct StreamNodeService {
    workflow: StreamWorkflow,
    max_sync_timeout_ms: u64,
}

impl StreamNodeService {
    pub fn new(workflow: StreamWorkflow, max_sync_timeout_ms: u64) -> Self {
        Self {
            workflow,
            max_sync_timeout_ms,
        }
    }

    pub fn workflow(&self) -> &StreamWorkflow {
        &self.workflow
    }

    pub fn store(&self) -> &Arc<dyn EventStore> {
        self.workflow.store()
    }

    /// Close the store; pending long polls return empty.
    pub async fn close(&self) {
        info!("Closing stream node service");
        self.store().close().await;
    }
}

#[async_trait]
impl StreamServiceApi for StreamNodeService {
    async fn create_user(&self, req: CreateStreamRequest) -> StreamResult<CreateStreamResponse> {
        let sync_cookie = self.workflow.create_user(&req.events).await?;
        Ok(CreateStreamResponse { sync_cookie })
    }

    async fn create_space(&self, req: CreateStreamRequest) -> StreamResult<CreateStreamResponse> {
        let sync_cookie = self.workflow.create_space(&req.events).await?;
        Ok(CreateStreamResponse { sync_cookie })
    }

    async fn create_channel(
        &self,
        req: CreateStreamRequest,
    ) -> StreamResult<CreateStreamResponse> {
        let sync_cookie = self.workflow.create_channel(&req.events).await?;
        Ok(CreateStreamResponse { sync_cookie })
    }

    async fn add_event(&self, req: AddEventRequest) -> StreamResult<AddEventResponse> {
        self.workflow.add_event(&req.stream_id, &req.event).await?;
        Ok(AddEventResponse::default())
    }

    async fn get_event_stream(&self, req: GetEventStreamRequest) -> StreamResult<StreamAndCookie> {
        self.store().get_event_stream(&req.stream_id).await
    }

    async fn sync_streams(&self, req: SyncStreamsRequest) -> StreamResult<SyncStreamsResponse> {
        let timeout_ms = req.timeout_ms.min(self.max_sync_timeout_ms);
        debug!(
            positions = req.sync_positions.len(),
            requested_ms = req.timeout_ms,
            timeout_ms,
            "syncStreams"
        );
        let streams = self
            .store()
            .read_new_events(&req.sync_positions, timeout_ms)
            .await?;
        Ok(SyncStreamsResponse { streams })
    }
}
