// Read engine: header cache, adaptive prefetch and the unified read path.

pub mod header;
pub mod prefetch;
pub mod reader;
pub mod stats;
