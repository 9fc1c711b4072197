//! # Stream Identifiers
//!
//! Stream id format rules. Ids double as storage names (`es_<id>` tables,
//! `es:<id>` keys), so they are restricted to a conservative character set
//! and must fit a 63-byte identifier once prefixed.

use crate::entities::StreamId;
use uuid::Uuid;

/// Prefix of user stream ids.
pub const USER_STREAM_ID_PREFIX: &str = "usr-";

/// Prefix of space stream ids.
pub const SPACE_STREAM_ID_PREFIX: &str = "spc-";

/// Prefix of channel stream ids.
pub const CHANNEL_STREAM_ID_PREFIX: &str = "chn-";

/// Longest accepted stream id.
pub const MAX_STREAM_ID_LEN: usize = 60;

const PREFIXES: [&str; 3] = [
    USER_STREAM_ID_PREFIX,
    SPACE_STREAM_ID_PREFIX,
    CHANNEL_STREAM_ID_PREFIX,
];

/// Derive the user stream id of a wallet address.
///
/// Case and an optional `0x` prefix are normalized away so that every
/// spelling of one address maps to the same stream.
#[must_use]
pub fn make_user_stream_id(address: &str) -> StreamId {
    let trimmed = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .unwrap_or(address);
    format!("{USER_STREAM_ID_PREFIX}{}", trimmed.to_ascii_lowercase())
}

/// Space stream id from a caller-chosen name.
#[must_use]
pub fn make_space_stream_id(name: &str) -> StreamId {
    format!("{SPACE_STREAM_ID_PREFIX}{name}")
}

/// Channel stream id from a caller-chosen name.
#[must_use]
pub fn make_channel_stream_id(name: &str) -> StreamId {
    format!("{CHANNEL_STREAM_ID_PREFIX}{name}")
}

/// Fresh random space stream id.
#[must_use]
pub fn make_unique_space_stream_id() -> StreamId {
    make_space_stream_id(&Uuid::new_v4().simple().to_string())
}

/// Fresh random channel stream id.
#[must_use]
pub fn make_unique_channel_stream_id() -> StreamId {
    make_channel_stream_id(&Uuid::new_v4().simple().to_string())
}

/// Whether `stream_id` is well formed: a known prefix, a non-empty body of
/// ASCII alphanumerics, `-` or `_`, and at most [`MAX_STREAM_ID_LEN`] bytes.
#[must_use]
pub fn is_valid_stream_id(stream_id: &str) -> bool {
    if stream_id.len() > MAX_STREAM_ID_LEN {
        return false;
    }
    let Some(body) = PREFIXES.iter().find_map(|p| stream_id.strip_prefix(p)) else {
        return false;
    };
    !body.is_empty()
        && body
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Whether `stream_id` carries the user prefix.
#[must_use]
pub fn is_user_stream_id(stream_id: &str) -> bool {
    stream_id.starts_with(USER_STREAM_ID_PREFIX)
}
