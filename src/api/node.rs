// File nodes: one byte source per file, read with the adapter's (buffer, position) call shape.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, warn};

use crate::channel::sync_channel::SyncChannel;
use crate::config::ReaderConfig;
use crate::engine::reader::RangeReader;
use crate::error::ReadResult;
use crate::source::http_source::HttpTransport;
use crate::source::shm_source::SharedMemoryTransport;
use crate::source::traits::ByteSource;

pub type RangeRequestSource = RangeReader<HttpTransport>;
pub type SharedMemorySource = RangeReader<SharedMemoryTransport>;

/// A blob already in memory. No header cache or prefetch: slicing is free.
pub struct BlobSource {
    data: Bytes,
}

impl BlobSource {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }
}

impl ByteSource for BlobSource {
    fn size(&mut self) -> i64 {
        self.data.len() as i64
    }

    fn read(&mut self, pos: u64, len: u64) -> ReadResult<Bytes> {
        let total = self.data.len() as u64;
        let start = pos.min(total);
        let end = pos.saturating_add(len).min(total);
        Ok(self.data.slice(start as usize..end as usize))
    }
}

pub struct FileNode {
    name: String,
    size: i64,
    source: Box<dyn ByteSource>,
}

impl FileNode {
    /// Node backed by a remote file. Fails if the size cannot be probed.
    pub fn from_url(
        name: impl Into<String>,
        url: String,
        headers: HashMap<String, String>,
        config: &ReaderConfig,
    ) -> ReadResult<Self> {
        let mut reader = RangeReader::new(HttpTransport::new(url, headers, config));
        let size = reader.try_size()?;
        Ok(Self::with_source(
            name,
            i64::try_from(size).unwrap_or(i64::MAX),
            Box::new(reader),
        ))
    }

    /// Node backed by a peer thread on `channel`. An unavailable size leaves the node at `-1`.
    pub fn from_channel(
        name: impl Into<String>,
        channel: Arc<SyncChannel>,
        config: &ReaderConfig,
    ) -> Self {
        let mut reader = RangeReader::new(SharedMemoryTransport::new(channel, config));
        let size = ByteSource::size(&mut reader);
        Self::with_source(name, size, Box::new(reader))
    }

    pub fn from_blob(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let mut source = BlobSource::new(data);
        let size = source.size();
        Self::with_source(name, size, Box::new(source))
    }

    pub fn with_source(name: impl Into<String>, size: i64, source: Box<dyn ByteSource>) -> Self {
        let name = name.into();
        debug!("file node {} size={}", name, size);
        Self { name, size, source }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> i64 {
        self.size
    }

    /// Fill `buf` from `position`. Returns the byte count, 0 at or past end-of-file.
    pub fn read_into(&mut self, buf: &mut [u8], position: u64) -> ReadResult<usize> {
        if buf.is_empty() || self.size < 0 || position >= self.size as u64 {
            return Ok(0);
        }
        let data = self.source.read(position, buf.len() as u64).map_err(|e| {
            warn!("read {} pos={} len={} failed: {}", self.name, position, buf.len(), e);
            e
        })?;
        let n = data.len().min(buf.len());
        buf[..n].copy_from_slice(&data[..n]);
        Ok(n)
    }
}
