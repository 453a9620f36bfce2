// Failure kinds surfaced to callers of `size()` / `read()` once a transport's retry budget is spent.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReadError {
    /// The size probe never produced a usable length.
    #[error("file size unavailable after {attempts} attempts")]
    SizeUnavailable { attempts: u32 },

    /// The size request itself failed at the transport level.
    #[error("size request failed: {reason}")]
    FetchFailed { reason: String },

    #[error("range fetch [{pos}, +{len}) failed: {reason}")]
    RangeFetchFailed { pos: u64, len: u64, reason: String },

    /// Every rendezvous attempt timed out without a reply from the peer.
    #[error("channel peer did not reply within {timeout:?} on {attempts} attempts")]
    ChannelTimeout { attempts: u32, timeout: Duration },

    #[error("channel protocol violation: {0}")]
    Protocol(String),
}

pub type ReadResult<T> = std::result::Result<T, ReadError>;
