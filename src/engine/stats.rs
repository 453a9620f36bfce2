// Read statistics: where each read was served from, and how much was fetched.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, PartialEq)]
pub struct StatsSnapshot {
    pub reads: u64,
    pub header_hits: u64,
    pub window_hits: u64,
    pub fetches: u64,
    pub fetched_bytes: u64,
    pub served_bytes: u64,
    /// Fraction of reads not served from the header cache that hit the prefetch window.
    pub window_hit_rate: f64,
}

#[derive(Debug, Default)]
pub struct ReadStats {
    reads: AtomicU64,
    header_hits: AtomicU64,
    window_hits: AtomicU64,
    fetches: AtomicU64,
    fetched_bytes: AtomicU64,
    served_bytes: AtomicU64,
}

impl ReadStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_header_hit(&self, served: u64) {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.header_hits.fetch_add(1, Ordering::Relaxed);
        self.served_bytes.fetch_add(served, Ordering::Relaxed);
    }

    pub fn record_window_hit(&self, served: u64) {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.window_hits.fetch_add(1, Ordering::Relaxed);
        self.served_bytes.fetch_add(served, Ordering::Relaxed);
    }

    /// A read that needed a transport fetch of `fetched` bytes to serve `served` bytes.
    pub fn record_miss(&self, fetched: u64, served: u64) {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.served_bytes.fetch_add(served, Ordering::Relaxed);
        self.record_fetch(fetched);
    }

    pub fn record_fetch(&self, fetched: u64) {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        self.fetched_bytes.fetch_add(fetched, Ordering::Relaxed);
    }

    pub fn fetches(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let reads = self.reads.load(Ordering::Relaxed);
        let header_hits = self.header_hits.load(Ordering::Relaxed);
        let window_hits = self.window_hits.load(Ordering::Relaxed);
        let body_reads = reads - header_hits;
        let window_hit_rate = if body_reads > 0 {
            window_hits as f64 / body_reads as f64
        } else {
            0.0
        };

        StatsSnapshot {
            reads,
            header_hits,
            window_hits,
            fetches: self.fetches.load(Ordering::Relaxed),
            fetched_bytes: self.fetched_bytes.load(Ordering::Relaxed),
            served_bytes: self.served_bytes.load(Ordering::Relaxed),
            window_hit_rate,
        }
    }
}
