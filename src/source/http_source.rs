use std::collections::HashMap;

use bytes::Bytes;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::CONTENT_LENGTH;
use reqwest::StatusCode;
use tracing::{debug, warn};

use super::traits::RangeTransport;
use crate::config::ReaderConfig;
use crate::error::{ReadError, ReadResult};

/// Blocking HTTP range-request transport against a static remote file.
///
/// Must run on a thread that may block, never inside an async task.
pub struct HttpTransport {
    client: Client,
    url: String,
    headers: HashMap<String, String>,
    attempts: u32,
    content_length: Option<u64>,
}

impl HttpTransport {
    pub fn new(url: String, headers: HashMap<String, String>, config: &ReaderConfig) -> Self {
        Self {
            client: Client::new(),
            url,
            headers,
            attempts: config.attempts(),
            content_length: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn with_headers(&self, mut req: RequestBuilder) -> RequestBuilder {
        for (k, v) in &self.headers {
            req = req.header(k.as_str(), v.as_str());
        }
        req
    }

    /// `bytes=pos-end`, with `end` clamped to the last byte when the length is known.
    fn range_header(&self, pos: u64, len: u64) -> String {
        let mut end = pos.saturating_add(len).saturating_sub(1);
        if let Some(total) = self.content_length {
            end = end.min(total.saturating_sub(1));
        }
        format!("bytes={}-{}", pos, end)
    }
}

impl RangeTransport for HttpTransport {
    fn describe(&self) -> String {
        self.url.clone()
    }

    fn probe_size(&mut self) -> ReadResult<u64> {
        let mut reason = String::new();
        for attempt in 1..=self.attempts {
            let resp = match self.with_headers(self.client.head(&self.url)).send() {
                Ok(resp) => resp,
                Err(e) => {
                    warn!("http head {} failed (attempt {}): {}", self.url, attempt, e);
                    reason = e.to_string();
                    continue;
                }
            };

            let status = resp.status();
            if !status.is_success() {
                warn!("http head {} status={} (attempt {})", self.url, status.as_u16(), attempt);
                reason = format!("HTTP {}", status.as_u16());
                continue;
            }

            let length = resp
                .headers()
                .get(CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            match length {
                Some(length) => {
                    self.content_length = Some(length);
                    return Ok(length);
                }
                None => {
                    warn!("http head {} has no content-length (attempt {})", self.url, attempt);
                    reason = "missing content-length".to_string();
                }
            }
        }

        Err(ReadError::FetchFailed {
            reason: format!("{} after {} attempts", reason, self.attempts),
        })
    }

    fn fetch_range(&mut self, pos: u64, len: u64) -> ReadResult<Bytes> {
        let range = self.range_header(pos, len);
        let mut reason = String::new();
        for attempt in 1..=self.attempts {
            let req = self.with_headers(self.client.get(&self.url)).header("Range", &range);
            let resp = match req.send() {
                Ok(resp) => resp,
                Err(e) => {
                    warn!("http fetch {} range={} failed (attempt {}): {}", self.url, range, attempt, e);
                    reason = e.to_string();
                    continue;
                }
            };

            let status = resp.status();
            if status != StatusCode::PARTIAL_CONTENT {
                warn!(
                    "http fetch {} status={} range={} (attempt {})",
                    self.url,
                    status.as_u16(),
                    range,
                    attempt
                );
                reason = format!("HTTP {}", status.as_u16());
                continue;
            }

            match resp.bytes() {
                Ok(body) => {
                    debug!("http fetch {} range={} bytes={}", self.url, range, body.len());
                    return Ok(body);
                }
                Err(e) => {
                    warn!("http fetch {} body read failed (attempt {}): {}", self.url, attempt, e);
                    reason = e.to_string();
                }
            }
        }

        Err(ReadError::RangeFetchFailed {
            pos,
            len,
            reason: format!("{} after {} attempts", reason, self.attempts),
        })
    }
}
