// Controller side of the sync channel: waits for requests and answers them from a backend.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use bytes::Bytes;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::layout::ChannelRequest;
use super::sync_channel::SyncChannel;
use crate::backend::traits::ByteBackend;

pub struct ChannelResponder {
    channel: Arc<SyncChannel>,
    backend: Arc<dyn ByteBackend>,
    poll_interval: Duration,
}

impl ChannelResponder {
    pub fn new(
        channel: Arc<SyncChannel>,
        backend: Arc<dyn ByteBackend>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            channel,
            backend,
            poll_interval,
        }
    }

    /// Run the serve loop on the current runtime until `shutdown` fires.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run(shutdown).await })
    }

    /// Serve requests until `shutdown` fires.
    ///
    /// Channel waits are blocking, so each one runs on the blocking pool and is bounded by
    /// the poll interval; the token is checked between waits.
    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        info!(
            "channel responder started (capacity={} bytes)",
            self.channel.payload_capacity()
        );
        loop {
            if shutdown.is_cancelled() {
                info!("channel responder stopped");
                return Ok(());
            }

            let channel = Arc::clone(&self.channel);
            let poll = self.poll_interval;
            let request = tokio::task::spawn_blocking(move || channel.wait_request(poll))
                .await
                .map_err(|e| anyhow!("channel wait task failed: {}", e))??;

            match request {
                None => continue,
                Some(request) => self.handle(request).await?,
            }
        }
    }

    async fn handle(&self, request: ChannelRequest) -> Result<()> {
        match request {
            ChannelRequest::Size => {
                let size = match self.backend.size().await {
                    Ok(size) => size,
                    Err(e) => {
                        // Zero tells the requester to ask again.
                        warn!("backend size failed: {}", e);
                        0
                    }
                };
                if !self.channel.complete_size(size) {
                    debug!("size reply dropped: request superseded");
                }
            }
            ChannelRequest::Range { pos, len } => {
                let want = len.min(self.channel.payload_capacity() as u64);
                let data = match self.backend.read_at(pos, want).await {
                    Ok(data) => data,
                    Err(e) => {
                        warn!("backend read pos={} len={} failed: {}", pos, want, e);
                        Bytes::new()
                    }
                };
                let data = data.slice(..data.len().min(want as usize));
                if !self.channel.complete_range(pos, len, &data)? {
                    debug!("range reply pos={} len={} dropped: request superseded", pos, len);
                } else {
                    debug!("range reply pos={} len={} bytes={}", pos, len, data.len());
                }
            }
        }
        Ok(())
    }
}
