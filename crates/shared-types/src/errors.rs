//! # Error Types
//!
//! The error taxonomy shared by the event store, the workflow layer and the
//! service facade. Every error carries a machine-checkable [`ErrorCode`] and
//! a human-readable message.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Machine-checkable error kind, serialized as `SCREAMING_SNAKE_CASE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    BadStreamId,
    BadStreamCreationParams,
    BadPrevEvents,
    BadEvent,
    BadEventHash,
    BadEventSignature,
    StreamAlreadyExists,
    StreamNotFound,
    UserCantPost,
    InternalErrorSwitch,
    InvalidArgument,
    StorageError,
    StoreClosed,
}

impl ErrorCode {
    /// Wire spelling of the code.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::BadStreamId => "BAD_STREAM_ID",
            ErrorCode::BadStreamCreationParams => "BAD_STREAM_CREATION_PARAMS",
            ErrorCode::BadPrevEvents => "BAD_PREV_EVENTS",
            ErrorCode::BadEvent => "BAD_EVENT",
            ErrorCode::BadEventHash => "BAD_EVENT_HASH",
            ErrorCode::BadEventSignature => "BAD_EVENT_SIGNATURE",
            ErrorCode::StreamAlreadyExists => "STREAM_ALREADY_EXISTS",
            ErrorCode::StreamNotFound => "STREAM_NOT_FOUND",
            ErrorCode::UserCantPost => "USER_CANT_POST",
            ErrorCode::InternalErrorSwitch => "INTERNAL_ERROR_SWITCH",
            ErrorCode::InvalidArgument => "INVALID_ARGUMENT",
            ErrorCode::StorageError => "STORAGE_ERROR",
            ErrorCode::StoreClosed => "STORE_CLOSED",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by stream operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StreamError {
    /// Stream id fails the format rules.
    #[error("Bad stream id: {stream_id}")]
    BadStreamId { stream_id: String },

    /// The event list submitted to create a stream is malformed.
    #[error("Bad stream creation params: {reason}")]
    BadStreamCreationParams { reason: String },

    /// The event does not chain onto known events of the target stream.
    #[error("Bad prev events: {reason}")]
    BadPrevEvents { reason: String },

    /// The event is not admissible in the target stream.
    #[error("Bad event: {reason}")]
    BadEvent { reason: String },

    /// The event hash does not match its base.
    #[error("Event hash mismatch: {hash}")]
    BadEventHash { hash: String },

    /// The event signature is malformed or not by the creator.
    #[error("Bad event signature: {reason}")]
    BadEventSignature { reason: String },

    /// Storage for the stream already exists.
    #[error("Stream already exists: {stream_id}")]
    StreamAlreadyExists { stream_id: String },

    /// Storage for the stream does not exist.
    #[error("Stream not found: {stream_id}")]
    StreamNotFound { stream_id: String },

    /// The creator is not a member of the channel.
    #[error("User {user_id} can't post to {stream_id}")]
    UserCantPost { user_id: String, stream_id: String },

    /// An exhaustive match reached a case that dispatch rules out.
    #[error("Internal error: unexpected {case} in switch")]
    InternalErrorSwitch { case: String },

    /// Caller passed an argument the store cannot act on.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Backend I/O or encoding failure.
    #[error("Storage error: {0}")]
    Storage(String),

    /// The store was closed.
    #[error("Event store is closed")]
    StoreClosed,
}

impl StreamError {
    /// Machine-checkable code of this error.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            StreamError::BadStreamId { .. } => ErrorCode::BadStreamId,
            StreamError::BadStreamCreationParams { .. } => ErrorCode::BadStreamCreationParams,
            StreamError::BadPrevEvents { .. } => ErrorCode::BadPrevEvents,
            StreamError::BadEvent { .. } => ErrorCode::BadEvent,
            StreamError::BadEventHash { .. } => ErrorCode::BadEventHash,
            StreamError::BadEventSignature { .. } => ErrorCode::BadEventSignature,
            StreamError::StreamAlreadyExists { .. } => ErrorCode::StreamAlreadyExists,
            StreamError::StreamNotFound { .. } => ErrorCode::StreamNotFound,
            StreamError::UserCantPost { .. } => ErrorCode::UserCantPost,
            StreamError::InternalErrorSwitch { .. } => ErrorCode::InternalErrorSwitch,
            StreamError::InvalidArgument(_) => ErrorCode::InvalidArgument,
            StreamError::Storage(_) => ErrorCode::StorageError,
            StreamError::StoreClosed => ErrorCode::StoreClosed,
        }
    }

    /// Whether this is the stream-not-found condition.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, StreamError::StreamNotFound { .. })
    }

    pub fn not_found(stream_id: impl Into<String>) -> Self {
        StreamError::StreamNotFound {
            stream_id: stream_id.into(),
        }
    }

    pub fn already_exists(stream_id: impl Into<String>) -> Self {
        StreamError::StreamAlreadyExists {
            stream_id: stream_id.into(),
        }
    }

    pub fn bad_creation(reason: impl Into<String>) -> Self {
        StreamError::BadStreamCreationParams {
            reason: reason.into(),
        }
    }

    pub fn bad_prev_events(reason: impl Into<String>) -> Self {
        StreamError::BadPrevEvents {
            reason: reason.into(),
        }
    }

    pub fn bad_event(reason: impl Into<String>) -> Self {
        StreamError::BadEvent {
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for StreamError {
    fn from(err: std::io::Error) -> Self {
        StreamError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for StreamError {
    fn from(err: serde_json::Error) -> Self {
        StreamError::Storage(format!("encoding: {err}"))
    }
}

/// Result alias for stream operations.
pub type StreamResult<T> = Result<T, StreamError>;
