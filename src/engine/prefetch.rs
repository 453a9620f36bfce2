// Adaptive read-ahead: grows the fetch window while reads stay sequential.

use crate::config::PREFETCH_GROWTH_CAP;

/// Prediction carried between misses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrefetchState {
    /// Position a sequential reader is expected to ask for next.
    pub expected_pos: u64,
    /// Length of the most recent fetch window.
    pub prefetch_len: u64,
}

/// A window to fetch: `[pos, pos + len)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPlan {
    pub pos: u64,
    pub len: u64,
    pub sequential: bool,
}

impl PrefetchState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide the next fetch window for a miss at `[pos, pos + len)` and advance the prediction.
    ///
    /// A read starting exactly at `expected_pos` doubles the previous window, capped at
    /// `PREFETCH_GROWTH_CAP` times the request length. Any other read fetches exactly `len`.
    /// The plan always covers the requested range.
    pub fn plan(&mut self, pos: u64, len: u64) -> FetchPlan {
        let sequential = pos == self.expected_pos;
        let fetch_len = if sequential {
            let doubled = self.prefetch_len.max(len).saturating_mul(2);
            len.saturating_mul(PREFETCH_GROWTH_CAP).min(doubled)
        } else {
            len
        };
        let fetch_len = fetch_len.max(len);

        self.prefetch_len = fetch_len;
        self.expected_pos = pos.saturating_add(fetch_len);

        FetchPlan {
            pos,
            len: fetch_len,
            sequential,
        }
    }
}
