use std::time::Duration;

use serde::Deserialize;

/// Number of leading file bytes kept in the immutable header cache.
pub const HEADER_CACHE_BYTES: u64 = 100;

/// Upper bound on sequential prefetch growth, as a multiple of the current request length.
pub const PREFETCH_GROWTH_CAP: u64 = 256;

/// Attempts made by a transport before a size or range request is reported as failed.
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

/// How long a shared-memory requester blocks for a reply before counting the attempt as missed.
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 60 * 1000;

/// Payload capacity of a freshly created sync channel (4 MB).
pub const DEFAULT_CHANNEL_PAYLOAD_BYTES: usize = 4 * 1024 * 1024;

/// Interval at which the responder re-checks its shutdown token while idle.
pub const DEFAULT_RESPONDER_POLL_MS: u64 = 250;

/// Log filter used when `RUST_LOG` is unset: crate output at info, HTTP stack at warn.
pub const DEFAULT_LOG_FILTER: &str = "info,hyper=warn,reqwest=warn";

/// Tunables shared by both transports and the channel responder.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Attempts per size probe or range fetch. Retries are issued back to back.
    pub retry_attempts: u32,
    /// Per-attempt wait on the shared-memory channel, in milliseconds.
    pub wait_timeout_ms: u64,
    /// Payload bytes reserved after the channel header.
    pub channel_payload_bytes: usize,
    /// Idle poll interval of the responder loop, in milliseconds.
    pub responder_poll_ms: u64,
}

impl ReaderConfig {
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }

    pub fn responder_poll(&self) -> Duration {
        Duration::from_millis(self.responder_poll_ms)
    }

    /// Retry budget, never less than a single attempt.
    pub fn attempts(&self) -> u32 {
        self.retry_attempts.max(1)
    }
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            wait_timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            channel_payload_bytes: DEFAULT_CHANNEL_PAYLOAD_BYTES,
            responder_poll_ms: DEFAULT_RESPONDER_POLL_MS,
        }
    }
}
