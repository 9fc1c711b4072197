//! # JSON Method Dispatcher
//!
//! Routes a method name and JSON params to [`StreamServiceApi`]. Params
//! and results use the camelCase wire format of `shared_types::api`.
//!
//! Errors carry the `StreamError` code, or `INVALID_ARGUMENT` for params
//! that do not decode, or `UNKNOWN_METHOD`.

use crate::service::StreamServiceApi;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use shared_types::StreamError;
use std::fmt;

/// Code for a method name the dispatcher does not route.
pub const UNKNOWN_METHOD: &str = "UNKNOWN_METHOD";

/// Every routed method name.
pub const METHODS: [&str; 6] = [
    "createUser",
    "createSpace",
    "createChannel",
    "addEvent",
    "getEventStream",
    "syncStreams",
];

/// Wire error: machine code plus message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RpcError {
    pub code: String,
    pub message: String,
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for RpcError {}

impl From<StreamError> for RpcError {
    fn from(err: StreamError) -> Self {
        Self {
            code: err.code().as_str().to_string(),
            message: err.to_string(),
        }
    }
}

/// Dispatch one call.
pub async fn dispatch(
    service: &dyn StreamServiceApi,
    method: &str,
    params: Value,
) -> Result<Value, RpcError> {
    match method {
        "createUser" => encode(service.create_user(decode(params)?).await?),
        "createSpace" => encode(service.create_space(decode(params)?).await?),
        "createChannel" => encode(service.create_channel(decode(params)?).await?),
        "addEvent" => encode(service.add_event(decode(params)?).await?),
        "getEventStream" => encode(service.get_event_stream(decode(params)?).await?),
        "syncStreams" => encode(service.sync_streams(decode(params)?).await?),
        _ => Err(RpcError {
            code: UNKNOWN_METHOD.to_string(),
            message: format!("Method not found: {}", method),
        }),
    }
}

fn decode<T: DeserializeOwned>(params: Value) -> Result<T, RpcError> {
    serde_json::from_value(params)
        .map_err(|e| StreamError::InvalidArgument(format!("params: {e}")).into())
}

fn encode<T: Serialize>(value: T) -> Result<Value, RpcError> {
    serde_json::to_value(value).map_err(|e| StreamError::Storage(format!("encoding: {e}")).into())
}
