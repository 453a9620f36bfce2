// Shared request/reply region with blocking wait/notify on the ready-state word.

use std::time::Duration;

use bytes::Bytes;
use parking_lot::{Condvar, Mutex};

use super::layout::{
    ChannelRequest, ReadyState, HEADER_BYTES, READY_STATE_I32, READY_STATE_U64, REQUEST_BUF_U8,
    REQUEST_LEN_U64, REQUEST_POS_U64,
};
use crate::error::{ReadError, ReadResult};

/// One rendezvous channel between a requesting worker and a serving peer.
///
/// The region follows the layout in [`super::layout`]. Both sides share it through an
/// `Arc<SyncChannel>`; every access happens under the region lock, and state changes
/// wake all waiters.
pub struct SyncChannel {
    region: Mutex<Box<[u8]>>,
    signal: Condvar,
    payload_capacity: usize,
}

fn load_u64(region: &[u8], word: usize) -> u64 {
    let offset = word * 8;
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&region[offset..offset + 8]);
    u64::from_le_bytes(raw)
}

fn store_u64(region: &mut [u8], word: usize, value: u64) {
    let offset = word * 8;
    region[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
}

fn load_u32(region: &[u8], word: usize) -> u32 {
    let offset = word * 4;
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&region[offset..offset + 4]);
    u32::from_le_bytes(raw)
}

fn state_code(region: &[u8]) -> u32 {
    load_u32(region, READY_STATE_I32)
}

fn store_state(region: &mut [u8], state: ReadyState) {
    store_u64(region, READY_STATE_U64, u64::from(state.code()));
}

impl SyncChannel {
    pub fn new(payload_capacity: usize) -> Self {
        Self {
            region: Mutex::new(vec![0u8; HEADER_BYTES + payload_capacity].into_boxed_slice()),
            signal: Condvar::new(),
            payload_capacity,
        }
    }

    pub fn payload_capacity(&self) -> usize {
        self.payload_capacity
    }

    pub fn ready_state(&self) -> ReadResult<ReadyState> {
        ReadyState::try_from(state_code(&self.region.lock()))
    }

    /// Raw 64-bit word at `index`, as a peer addressing the region by u64 would see it.
    pub fn word_u64(&self, index: usize) -> Option<u64> {
        let region = self.region.lock();
        ((index + 1) * 8 <= region.len()).then(|| load_u64(&region, index))
    }

    /// Raw 32-bit word at `index`.
    pub fn word_i32(&self, index: usize) -> Option<i32> {
        let region = self.region.lock();
        ((index + 1) * 4 <= region.len()).then(|| load_u32(&region, index) as i32)
    }

    pub fn byte(&self, index: usize) -> Option<u8> {
        self.region.lock().get(index).copied()
    }

    // Requester side.

    /// Post `request`, overwriting whatever header is present, and wake the peer.
    pub fn submit(&self, request: ChannelRequest) {
        let mut region = self.region.lock();
        region[..HEADER_BYTES].fill(0);
        if let ChannelRequest::Range { pos, len } = request {
            store_u64(&mut region, REQUEST_POS_U64, pos);
            store_u64(&mut region, REQUEST_LEN_U64, len);
        }
        store_state(&mut region, request.ready_state());
        self.signal.notify_all();
    }

    /// Block until the peer marks the request completed. Returns `false` on timeout.
    pub fn wait_completed(&self, timeout: Duration) -> bool {
        let mut region = self.region.lock();
        let completed = ReadyState::Completed.code();
        self.signal
            .wait_while_for(&mut region, |r| state_code(r) != completed, timeout);
        state_code(&region) == completed
    }

    /// Length written by the peer in reply to a size request.
    pub fn size_reply(&self) -> u64 {
        load_u64(&self.region.lock(), REQUEST_LEN_U64)
    }

    /// Copy the payload of a completed range reply out of the region.
    ///
    /// The region is reused by the next request, so the reply is always copied.
    pub fn range_reply(&self) -> ReadResult<Bytes> {
        let region = self.region.lock();
        let len = load_u64(&region, REQUEST_LEN_U64);
        if len > self.payload_capacity as u64 {
            return Err(ReadError::Protocol(format!(
                "reply length {} exceeds payload capacity {}",
                len, self.payload_capacity
            )));
        }
        let len = len as usize;
        Ok(Bytes::copy_from_slice(
            &region[REQUEST_BUF_U8..REQUEST_BUF_U8 + len],
        ))
    }

    // Peer side.

    /// Block until a request is pending. Returns `None` on timeout.
    pub fn wait_request(&self, timeout: Duration) -> ReadResult<Option<ChannelRequest>> {
        let mut region = self.region.lock();
        let completed = ReadyState::Completed.code();
        self.signal
            .wait_while_for(&mut region, |r| state_code(r) == completed, timeout);

        match ReadyState::try_from(state_code(&region))? {
            ReadyState::Completed => Ok(None),
            ReadyState::SizeRequested => Ok(Some(ChannelRequest::Size)),
            ReadyState::RangeRequested => Ok(Some(ChannelRequest::Range {
                pos: load_u64(&region, REQUEST_POS_U64),
                len: load_u64(&region, REQUEST_LEN_U64),
            })),
        }
    }

    /// Answer a size request. Returns `false` if the request was withdrawn or replaced meanwhile.
    pub fn complete_size(&self, size: u64) -> bool {
        let mut region = self.region.lock();
        if state_code(&region) != ReadyState::SizeRequested.code() {
            return false;
        }
        store_u64(&mut region, REQUEST_LEN_U64, size);
        store_state(&mut region, ReadyState::Completed);
        self.signal.notify_all();
        true
    }

    /// Answer the range request `[pos, pos + len)` with `data`.
    ///
    /// Returns `Ok(false)` without touching the region if the header no longer describes
    /// that request. An empty `data` tells the requester to ask again.
    pub fn complete_range(&self, pos: u64, len: u64, data: &[u8]) -> ReadResult<bool> {
        if data.len() > self.payload_capacity || data.len() as u64 > len {
            return Err(ReadError::Protocol(format!(
                "reply of {} bytes for request of {} (capacity {})",
                data.len(),
                len,
                self.payload_capacity
            )));
        }

        let mut region = self.region.lock();
        let current = state_code(&region) == ReadyState::RangeRequested.code()
            && load_u64(&region, REQUEST_POS_U64) == pos
            && load_u64(&region, REQUEST_LEN_U64) == len;
        if !current {
            return Ok(false);
        }

        region[REQUEST_BUF_U8..REQUEST_BUF_U8 + data.len()].copy_from_slice(data);
        store_u64(&mut region, REQUEST_LEN_U64, data.len() as u64);
        store_state(&mut region, ReadyState::Completed);
        self.signal.notify_all();
        Ok(true)
    }
}

impl std::fmt::Debug for SyncChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncChannel")
            .field("payload_capacity", &self.payload_capacity)
            .finish_non_exhaustive()
    }
}
