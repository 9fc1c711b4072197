//! # Inbound Ports
//!
//! The write-side API of the workflow layer.

use async_trait::async_trait;
use shared_types::{FullEvent, StreamResult, SyncCookie};

/// Stream creation and event admission.
///
/// Implementations must be thread-safe (`Send + Sync`).
#[async_trait]
pub trait StreamWorkflowApi: Send + Sync {
    /// Create the personal stream of the inception creator.
    async fn create_user(&self, events: &[FullEvent]) -> StreamResult<SyncCookie>;

    /// Create a space from inception plus self-join, then mirror the join
    /// into the creator's user stream.
    async fn create_space(&self, events: &[FullEvent]) -> StreamResult<SyncCookie>;

    /// Create a channel under an existing space, then record it in the
    /// space and mirror the join into the creator's user stream.
    async fn create_channel(&self, events: &[FullEvent]) -> StreamResult<SyncCookie>;

    /// Admit one client event into an existing stream.
    ///
    /// Returns the cookie of the primary write.
    async fn add_event(&self, stream_id: &str, event: &FullEvent) -> StreamResult<SyncCookie>;
}
