//! Wire layout of the shared-memory sync channel.
//!
//! The region is a fixed header of three 64-bit fields followed by the payload:
//!
//! | Field             | u64 word | i32 word | byte | Meaning                                   |
//! |-------------------|----------|----------|------|-------------------------------------------|
//! | `readyState`      | 0        | 0        | 0    | see [`ReadyState`]                        |
//! | `requestLength`   | 1        | 2        | 8    | request: bytes wanted; reply: see below   |
//! | `requestPosition` | 2        | 4        | 16   | requested byte offset                     |
//! | `requestBuffer`   | 3..      | 6..      | 24.. | payload bytes                             |
//!
//! All integers are little-endian. Only the low 32 bits of `readyState` carry the
//! state code, so a peer may wait on it as a 32-bit word.
//!
//! Handshake, one request at a time:
//!
//! 1. The requester zeroes the header, writes `requestPosition` / `requestLength`
//!    (range requests only), stores `SizeRequested` or `RangeRequested`, and notifies.
//! 2. The peer waits while `readyState == Completed`, then serves the request.
//!    For a size request it writes the file length into `requestLength`; for a range
//!    request it copies the bytes into `requestBuffer` and writes their count into
//!    `requestLength` (zero means "no data, ask again").
//! 3. The peer stores `Completed` and notifies; the requester copies the reply out.

use crate::error::ReadError;

pub const READY_STATE_U64: usize = 0;
pub const REQUEST_LEN_U64: usize = 1;
pub const REQUEST_POS_U64: usize = 2;
pub const REQUEST_BUF_U64: usize = 3;

pub const READY_STATE_I32: usize = READY_STATE_U64 * 2;
pub const REQUEST_LEN_I32: usize = REQUEST_LEN_U64 * 2;
pub const REQUEST_POS_I32: usize = REQUEST_POS_U64 * 2;
pub const REQUEST_BUF_I32: usize = REQUEST_BUF_U64 * 2;

pub const READY_STATE_U8: usize = READY_STATE_U64 * 8;
pub const REQUEST_LEN_U8: usize = REQUEST_LEN_U64 * 8;
pub const REQUEST_POS_U8: usize = REQUEST_POS_U64 * 8;
pub const REQUEST_BUF_U8: usize = REQUEST_BUF_U64 * 8;

/// Size of the fixed header in bytes.
pub const HEADER_BYTES: usize = REQUEST_BUF_U8;

/// State codes stored in `readyState`. Codes are multiples of 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ReadyState {
    /// Idle, or the last request has been answered.
    Completed = 0,
    SizeRequested = 4,
    RangeRequested = 8,
}

impl ReadyState {
    pub fn code(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for ReadyState {
    type Error = ReadError;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Completed),
            4 => Ok(Self::SizeRequested),
            8 => Ok(Self::RangeRequested),
            other => Err(ReadError::Protocol(format!("unknown ready state {}", other))),
        }
    }
}

/// A request as read back from the header by the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelRequest {
    Size,
    Range { pos: u64, len: u64 },
}

impl ChannelRequest {
    pub fn ready_state(&self) -> ReadyState {
        match self {
            Self::Size => ReadyState::SizeRequested,
            Self::Range { .. } => ReadyState::RangeRequested,
        }
    }
}
