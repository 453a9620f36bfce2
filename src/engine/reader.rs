// Unified read path shared by every transport.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info, warn};

use super::header::HeaderCache;
use super::prefetch::PrefetchState;
use super::stats::ReadStats;
use crate::config::HEADER_CACHE_BYTES;
use crate::error::{ReadError, ReadResult};
use crate::source::traits::{ByteSource, RangeTransport};

/// The most recently fetched contiguous range. Replaced wholesale on every miss.
#[derive(Debug, Clone)]
struct PrefetchWindow {
    start: u64,
    data: Bytes,
}

impl PrefetchWindow {
    fn end(&self) -> u64 {
        self.start + self.data.len() as u64
    }

    fn slice(&self, pos: u64, len: u64) -> Option<Bytes> {
        if pos < self.start || pos.checked_add(len)? > self.end() {
            return None;
        }
        let offset = (pos - self.start) as usize;
        Some(self.data.slice(offset..offset + len as usize))
    }
}

pub struct RangeReader<T: RangeTransport> {
    transport: T,
    size: Option<u64>,
    header: HeaderCache,
    window: Option<PrefetchWindow>,
    prefetch: PrefetchState,
    stats: Arc<ReadStats>,
}

impl<T: RangeTransport> RangeReader<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            size: None,
            header: HeaderCache::new(),
            window: None,
            prefetch: PrefetchState::new(),
            stats: Arc::new(ReadStats::new()),
        }
    }

    /// File length, probed on first use and remembered once known.
    ///
    /// A failed probe is not remembered, so a later call probes again.
    pub fn try_size(&mut self) -> ReadResult<u64> {
        if let Some(size) = self.size {
            return Ok(size);
        }
        let size = self.transport.probe_size()?;
        info!("{} size={}", self.transport.describe(), size);
        self.size = Some(size);
        Ok(size)
    }

    /// Read `[pos, pos + len)`, clamped at end-of-file.
    pub fn read(&mut self, pos: u64, len: u64) -> ReadResult<Bytes> {
        let size = self.try_size()?;
        if len == 0 || pos >= size {
            return Ok(Bytes::new());
        }
        let len = len.min(size - pos);

        if HeaderCache::covers(pos, len) {
            return self.read_header(pos, len, size);
        }

        if let Some(data) = self.window.as_ref().and_then(|w| w.slice(pos, len)) {
            self.stats.record_window_hit(len);
            return Ok(data);
        }

        let plan = self.prefetch.plan(pos, len);
        // Never ask for less than the caller needs, never past end-of-file.
        let fetch_len = plan.len.max(len).min(size - pos);
        let data = self.transport.fetch_range(pos, fetch_len)?;
        debug!(
            "{} fetch pos={} len={} got={} sequential={} next_expected={}",
            self.transport.describe(),
            pos,
            fetch_len,
            data.len(),
            plan.sequential,
            self.prefetch.expected_pos
        );

        let window = PrefetchWindow { start: pos, data };
        let fetched = window.data.len() as u64;
        let served = window.slice(pos, len).ok_or_else(|| {
            warn!(
                "{} short response pos={} wanted={} got={}",
                self.transport.describe(),
                pos,
                len,
                fetched
            );
            ReadError::RangeFetchFailed {
                pos,
                len,
                reason: format!("short response: {} of {} bytes", fetched, len),
            }
        })?;

        self.window = Some(window);
        self.stats.record_miss(fetched, len);
        Ok(served)
    }

    fn read_header(&mut self, pos: u64, len: u64, size: u64) -> ReadResult<Bytes> {
        if let Some(data) = self.header.get(pos, len) {
            self.stats.record_header_hit(len);
            return Ok(data);
        }

        let header_len = HEADER_CACHE_BYTES.min(size);
        let data = self.transport.fetch_range(0, header_len)?;
        let fetched = data.len() as u64;
        if fetched < header_len {
            return Err(ReadError::RangeFetchFailed {
                pos: 0,
                len: header_len,
                reason: format!("short header: {} of {} bytes", fetched, header_len),
            });
        }
        debug!("{} header cached ({} bytes)", self.transport.describe(), header_len);
        self.header.populate(data);
        self.stats.record_miss(fetched, len);

        self.header
            .get(pos, len)
            .ok_or_else(|| ReadError::Protocol("header cache empty after populate".to_string()))
    }

    pub fn stats(&self) -> Arc<ReadStats> {
        Arc::clone(&self.stats)
    }

    pub fn prefetch_state(&self) -> PrefetchState {
        self.prefetch
    }

    /// `[start, end)` of the current prefetch window, if any.
    pub fn window_range(&self) -> Option<(u64, u64)> {
        self.window.as_ref().map(|w| (w.start, w.end()))
    }

    pub fn header_cached(&self) -> bool {
        self.header.is_populated()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T: RangeTransport> ByteSource for RangeReader<T> {
    fn size(&mut self) -> i64 {
        match self.try_size() {
            Ok(size) => i64::try_from(size).unwrap_or(i64::MAX),
            Err(e) => {
                warn!("{} size unavailable: {}", self.transport.describe(), e);
                -1
            }
        }
    }

    fn read(&mut self, pos: u64, len: u64) -> ReadResult<Bytes> {
        RangeReader::read(self, pos, len)
    }
}
