use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::Mutex;
use tracing::debug;

use super::traits::ByteBackend;

/// Local file read through a single handle. Seek and read happen under one lock.
pub struct FileBackend {
    file: Mutex<File>,
    path: PathBuf,
}

impl FileBackend {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)
            .await
            .map_err(|e| anyhow!("open {} failed: {}", path.display(), e))?;
        Ok(Self {
            file: Mutex::new(file),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ByteBackend for FileBackend {
    async fn size(&self) -> Result<u64> {
        let file = self.file.lock().await;
        Ok(file.metadata().await?.len())
    }

    async fn read_at(&self, pos: u64, len: u64) -> Result<Bytes> {
        let mut file = self.file.lock().await;
        let total = file.metadata().await?.len();
        let want = len.min(total.saturating_sub(pos)) as usize;
        if want == 0 {
            return Ok(Bytes::new());
        }

        file.seek(SeekFrom::Start(pos)).await?;
        let mut buf = BytesMut::zeroed(want);
        let mut filled = 0;
        while filled < want {
            let n = file.read(&mut buf[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        buf.truncate(filled);
        debug!("file {} read pos={} len={}", self.path.display(), pos, filled);
        Ok(buf.freeze())
    }
}
