use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;

/// Controller-side store that answers channel requests: a blob, a file, or a network resource.
#[async_trait]
pub trait ByteBackend: Send + Sync {
    async fn size(&self) -> Result<u64>;

    /// Read `[pos, pos + len)`. Shorter results are allowed only at end-of-file.
    async fn read_at(&self, pos: u64, len: u64) -> Result<Bytes>;
}
