use std::collections::HashMap;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use reqwest::{Client, RequestBuilder, StatusCode};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use super::traits::ByteBackend;

/// Remote file fetched with async range requests, for serving a channel from the network.
pub struct HttpBackend {
    client: Client,
    url: RwLock<String>,
    headers: RwLock<HashMap<String, String>>,
    content_length: OnceCell<u64>,
}

fn is_auth_rejection(status: StatusCode) -> bool {
    matches!(status.as_u16(), 401 | 403 | 412)
}

impl HttpBackend {
    pub fn new(url: String, headers: HashMap<String, String>) -> Self {
        Self {
            client: Client::new(),
            url: RwLock::new(url),
            headers: RwLock::new(headers),
            content_length: OnceCell::new(),
        }
    }

    /// Update the URL and headers (e.g. after token refresh).
    pub fn update_auth(&self, new_url: String, new_headers: HashMap<String, String>) {
        if !new_url.trim().is_empty() {
            *self.url.write() = new_url;
        }
        if !new_headers.is_empty() {
            *self.headers.write() = new_headers;
        }
    }

    /// Build a GET request with the current URL, custom headers, and a Range header.
    fn build_request(&self, range: &str) -> RequestBuilder {
        let url = self.url.read().clone();
        let headers = self.headers.read().clone();

        let mut req = self.client.get(&url);
        for (k, v) in &headers {
            req = req.header(k.as_str(), v.as_str());
        }
        req.header("Range", range)
    }

    async fn probe(&self) -> Result<u64> {
        let resp = self.build_request("bytes=0-0").send().await?;

        let status = resp.status();
        debug!("http backend probe status={}", status.as_u16());
        if is_auth_rejection(status) {
            warn!("http backend probe auth rejected status={}", status.as_u16());
            return Err(anyhow!("auth_rejected: HTTP {}", status.as_u16()));
        }
        if !status.is_success() {
            return Err(anyhow!("probe failed: HTTP {}", status.as_u16()));
        }

        // Content-Range: bytes 0-0/<total> when ranges are honoured.
        let length = if status == StatusCode::PARTIAL_CONTENT {
            resp.headers()
                .get("content-range")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.rsplit('/').next())
                .and_then(|v| v.parse::<u64>().ok())
        } else {
            resp.headers()
                .get("content-length")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
        };
        length.ok_or_else(|| anyhow!("probe response carries no length"))
    }
}

#[async_trait]
impl ByteBackend for HttpBackend {
    async fn size(&self) -> Result<u64> {
        self.content_length
            .get_or_try_init(|| self.probe())
            .await
            .copied()
    }

    async fn read_at(&self, pos: u64, len: u64) -> Result<Bytes> {
        let total = self.size().await?;
        if len == 0 || pos >= total {
            return Ok(Bytes::new());
        }
        let end = pos.saturating_add(len).min(total) - 1;
        let range = format!("bytes={}-{}", pos, end);
        let resp = self.build_request(&range).send().await?;

        let status = resp.status();
        if is_auth_rejection(status) {
            warn!("http backend fetch auth rejected status={} range={}", status.as_u16(), range);
            return Err(anyhow!("auth_rejected: HTTP {}", status.as_u16()));
        }
        match status {
            StatusCode::PARTIAL_CONTENT => Ok(resp.bytes().await?),
            // Server ignored the range and sent the whole body.
            StatusCode::OK => {
                let body = resp.bytes().await?;
                let start = (pos as usize).min(body.len());
                let stop = (end as usize + 1).min(body.len());
                Ok(body.slice(start..stop))
            }
            _ => {
                warn!("http backend fetch failed status={} range={}", status.as_u16(), range);
                Err(anyhow!("fetch_range failed: HTTP {}", status.as_u16()))
            }
        }
    }
}
