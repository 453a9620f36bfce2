use bytes::Bytes;

use crate::error::ReadResult;

/// A blocking byte-range transport: the minimal capability the read algorithm needs.
///
/// Implementations own their retry budget. An `Err` means the budget is spent.
pub trait RangeTransport: Send {
    /// Short description for log lines (URL, channel id).
    fn describe(&self) -> String;

    fn probe_size(&mut self) -> ReadResult<u64>;

    /// Fetch `[pos, pos + len)`. The result may be shorter only at end-of-file.
    fn fetch_range(&mut self, pos: u64, len: u64) -> ReadResult<Bytes>;
}

/// Random-access view of one file, as seen by the filesystem adapter.
pub trait ByteSource: Send {
    /// File length in bytes, or a negative value when it cannot be determined.
    fn size(&mut self) -> i64;

    /// Read `[pos, pos + len)`. Returns fewer bytes only at end-of-file.
    fn read(&mut self, pos: u64, len: u64) -> ReadResult<Bytes>;
}
