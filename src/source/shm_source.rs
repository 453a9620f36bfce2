use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tracing::{debug, warn};

use super::traits::RangeTransport;
use crate::channel::layout::ChannelRequest;
use crate::channel::sync_channel::SyncChannel;
use crate::config::ReaderConfig;
use crate::error::{ReadError, ReadResult};

/// Requester side of a [`SyncChannel`]: asks a peer thread for sizes and byte ranges.
///
/// Strictly one outstanding request; callers sharing a channel must serialize externally.
pub struct SharedMemoryTransport {
    channel: Arc<SyncChannel>,
    timeout: Duration,
    attempts: u32,
    size: Option<u64>,
}

enum Attempt<T> {
    Reply(T),
    Empty,
    TimedOut,
}

impl SharedMemoryTransport {
    pub fn new(channel: Arc<SyncChannel>, config: &ReaderConfig) -> Self {
        Self {
            channel,
            timeout: config.wait_timeout(),
            attempts: config.attempts(),
            size: None,
        }
    }

    pub fn channel(&self) -> &Arc<SyncChannel> {
        &self.channel
    }

    fn round_trip(&self, request: ChannelRequest) -> bool {
        self.channel.submit(request);
        self.channel.wait_completed(self.timeout)
    }

    fn size_attempt(&self) -> Attempt<u64> {
        if !self.round_trip(ChannelRequest::Size) {
            return Attempt::TimedOut;
        }
        match self.channel.size_reply() {
            0 => Attempt::Empty,
            size => Attempt::Reply(size),
        }
    }

    fn range_attempt(&self, pos: u64, len: u64) -> ReadResult<Attempt<Bytes>> {
        if !self.round_trip(ChannelRequest::Range { pos, len }) {
            return Ok(Attempt::TimedOut);
        }
        let payload = self.channel.range_reply()?;
        if payload.is_empty() {
            return Ok(Attempt::Empty);
        }
        if payload.len() as u64 > len {
            return Err(ReadError::Protocol(format!(
                "peer replied {} bytes to a {} byte request",
                payload.len(),
                len
            )));
        }
        Ok(Attempt::Reply(payload))
    }

    /// One chunk of at most the channel capacity, retried within the attempt budget.
    fn fetch_chunk(&self, pos: u64, len: u64) -> ReadResult<Bytes> {
        let mut timeouts = 0;
        for attempt in 1..=self.attempts {
            match self.range_attempt(pos, len)? {
                Attempt::Reply(data) => return Ok(data),
                Attempt::Empty => {
                    warn!("channel range pos={} len={} empty reply (attempt {})", pos, len, attempt);
                }
                Attempt::TimedOut => {
                    timeouts += 1;
                    warn!("channel range pos={} len={} timed out (attempt {})", pos, len, attempt);
                }
            }
        }

        if timeouts == self.attempts {
            Err(ReadError::ChannelTimeout {
                attempts: self.attempts,
                timeout: self.timeout,
            })
        } else {
            Err(ReadError::RangeFetchFailed {
                pos,
                len,
                reason: format!("no payload after {} attempts", self.attempts),
            })
        }
    }
}

impl RangeTransport for SharedMemoryTransport {
    fn describe(&self) -> String {
        format!("channel(capacity={})", self.channel.payload_capacity())
    }

    /// A zero length means the peer is still preparing; it is retried like a timeout.
    fn probe_size(&mut self) -> ReadResult<u64> {
        for attempt in 1..=self.attempts {
            match self.size_attempt() {
                Attempt::Reply(size) => {
                    self.size = Some(size);
                    return Ok(size);
                }
                Attempt::Empty => warn!("channel size reply was 0 (attempt {})", attempt),
                Attempt::TimedOut => warn!("channel size request timed out (attempt {})", attempt),
            }
        }
        Err(ReadError::SizeUnavailable {
            attempts: self.attempts,
        })
    }

    /// Large ranges are split into capacity-sized round-trips, clamped to the probed size.
    /// A short chunk ends the fetch.
    fn fetch_range(&mut self, pos: u64, len: u64) -> ReadResult<Bytes> {
        let capacity = self.channel.payload_capacity() as u64;
        if capacity == 0 {
            return Err(ReadError::Protocol("channel has no payload capacity".to_string()));
        }
        if len <= capacity && self.size.is_none() {
            return self.fetch_chunk(pos, len);
        }

        // Multi-chunk fetches need the size so no chunk starts at or past end-of-file.
        let size = match self.size {
            Some(size) => size,
            None => self.probe_size()?,
        };
        let len = len.min(size.saturating_sub(pos));
        if len == 0 {
            return Ok(Bytes::new());
        }
        if len <= capacity {
            return self.fetch_chunk(pos, len);
        }

        let mut out = BytesMut::with_capacity(len as usize);
        let mut offset = 0u64;
        while offset < len {
            let want = (len - offset).min(capacity);
            let chunk = self.fetch_chunk(pos + offset, want)?;
            let got = chunk.len() as u64;
            out.extend_from_slice(&chunk);
            offset += got;
            if got < want {
                debug!("channel range ended early at {} (eof)", pos + offset);
                break;
            }
        }
        Ok(out.freeze())
    }
}
