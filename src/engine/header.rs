// Immutable cache of a file's leading bytes, filled by exactly one fetch.

use bytes::Bytes;

use crate::config::HEADER_CACHE_BYTES;

#[derive(Debug, Default)]
pub struct HeaderCache {
    bytes: Option<Bytes>,
}

impl HeaderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `[pos, pos + len)` lies inside the cached header region.
    pub fn covers(pos: u64, len: u64) -> bool {
        pos.checked_add(len)
            .is_some_and(|end| end <= HEADER_CACHE_BYTES)
    }

    pub fn is_populated(&self) -> bool {
        self.bytes.is_some()
    }

    /// Cached bytes for `[pos, pos + len)`, or `None` on a miss.
    ///
    /// The slice is truncated when the file itself is shorter than the header region.
    pub fn get(&self, pos: u64, len: u64) -> Option<Bytes> {
        if !Self::covers(pos, len) {
            return None;
        }
        let bytes = self.bytes.as_ref()?;
        let start = (pos as usize).min(bytes.len());
        let end = ((pos + len) as usize).min(bytes.len());
        Some(bytes.slice(start..end))
    }

    /// Store the header. Later calls are ignored; the header never changes once set.
    pub fn populate(&mut self, bytes: Bytes) {
        if self.bytes.is_some() {
            return;
        }
        let keep = bytes.len().min(HEADER_CACHE_BYTES as usize);
        self.bytes = Some(bytes.slice(..keep));
    }

    pub fn len(&self) -> usize {
        self.bytes.as_ref().map_or(0, Bytes::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
