use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;

use super::traits::ByteBackend;

/// In-memory blob. Reads are zero-copy slices of the shared buffer.
pub struct MemoryBackend {
    data: Bytes,
}

impl MemoryBackend {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }
}

#[async_trait]
impl ByteBackend for MemoryBackend {
    async fn size(&self) -> Result<u64> {
        Ok(self.data.len() as u64)
    }

    async fn read_at(&self, pos: u64, len: u64) -> Result<Bytes> {
        let total = self.data.len() as u64;
        let start = pos.min(total);
        let end = pos.saturating_add(len).min(total);
        Ok(self.data.slice(start as usize..end as usize))
    }
}
