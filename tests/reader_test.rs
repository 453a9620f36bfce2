use bytes::Bytes;

use range_vfs::{ByteSource, RangeReader, RangeTransport, ReadError, ReadResult};

/// Deterministic content: byte `i` is `i % 251`.
fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// In-memory transport that records every fetch it serves.
struct ScriptedTransport {
    data: Vec<u8>,
    fetches: Vec<(u64, u64)>,
    probes: u32,
    failing_probes: u32,
    truncate_replies: bool,
}

impl ScriptedTransport {
    fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            fetches: Vec::new(),
            probes: 0,
            failing_probes: 0,
            truncate_replies: false,
        }
    }
}

impl RangeTransport for ScriptedTransport {
    fn describe(&self) -> String {
        "scripted".to_string()
    }

    fn probe_size(&mut self) -> ReadResult<u64> {
        self.probes += 1;
        if self.failing_probes > 0 {
            self.failing_probes -= 1;
            return Err(ReadError::FetchFailed {
                reason: "HTTP 503 after 3 attempts".to_string(),
            });
        }
        Ok(self.data.len() as u64)
    }

    fn fetch_range(&mut self, pos: u64, len: u64) -> ReadResult<Bytes> {
        self.fetches.push((pos, len));
        let start = (pos as usize).min(self.data.len());
        let mut end = ((pos + len) as usize).min(self.data.len());
        if self.truncate_replies {
            end = start + (end - start) / 2;
        }
        Ok(Bytes::copy_from_slice(&self.data[start..end]))
    }
}

fn scripted_reader(len: usize) -> RangeReader<ScriptedTransport> {
    RangeReader::new(ScriptedTransport::new(pattern(len)))
}

#[test]
fn test_header_reads_fetch_once() {
    let mut reader = scripted_reader(10_000);

    let first = reader.read(0, 50).unwrap();
    let second = reader.read(0, 50).unwrap();
    let inner = reader.read(10, 20).unwrap();

    assert_eq!(first, second);
    assert_eq!(&first[..], &pattern(50)[..]);
    assert_eq!(&inner[..], &pattern(30)[10..30]);
    assert_eq!(reader.transport().fetches, vec![(0, 100)]);
    assert!(reader.header_cached());
    assert_eq!(reader.stats().snapshot().header_hits, 2);
}

#[test]
fn test_thousand_byte_scenario() {
    let mut reader = scripted_reader(1000);

    let head = reader.read(0, 50).unwrap();
    assert_eq!(&head[..], &pattern(50)[..]);
    assert_eq!(reader.transport().fetches, vec![(0, 100)]);

    let cold = reader.read(200, 10).unwrap();
    assert_eq!(&cold[..], &pattern(1000)[200..210]);
    assert_eq!(reader.transport().fetches.last(), Some(&(200, 10)));
    assert_eq!(reader.prefetch_state().expected_pos, 210);
    assert_eq!(reader.prefetch_state().prefetch_len, 10);

    let warm = reader.read(210, 10).unwrap();
    assert_eq!(&warm[..], &pattern(1000)[210..220]);
    assert_eq!(reader.transport().fetches.last(), Some(&(210, 20)));
    assert_eq!(reader.prefetch_state().expected_pos, 230);

    // Second half of the 20-byte window needs no fetch.
    let hit = reader.read(220, 10).unwrap();
    assert_eq!(&hit[..], &pattern(1000)[220..230]);
    assert_eq!(reader.transport().fetches.len(), 3);
}

#[test]
fn test_sequential_growth_is_capped() {
    let mut reader = scripted_reader(4 * 1024 * 1024);
    let len = 16u64;

    reader.read(1000, len).unwrap();
    for _ in 0..12 {
        let next = reader.prefetch_state().expected_pos;
        reader.read(next, len).unwrap();
    }

    let lengths: Vec<u64> = reader.transport().fetches.iter().map(|&(_, l)| l).collect();
    assert_eq!(lengths[0], len);
    for pair in lengths[..9].windows(2) {
        assert!(pair[1] > pair[0], "window must grow: {:?}", lengths);
    }
    assert_eq!(lengths[8], 256 * len);
    assert!(lengths[8..].iter().all(|&l| l == 256 * len));
}

#[test]
fn test_random_read_resets_prefetch() {
    let mut reader = scripted_reader(1024 * 1024);
    reader.read(4096, 512).unwrap();
    reader.read(4608, 512).unwrap();
    reader.read(5632, 512).unwrap();
    assert_eq!(reader.prefetch_state().prefetch_len, 2048);

    reader.read(500_000, 300).unwrap();
    assert_eq!(reader.transport().fetches.last(), Some(&(500_000, 300)));
    assert_eq!(reader.prefetch_state().prefetch_len, 300);

    // Backwards is random access too.
    reader.read(200, 64).unwrap();
    assert_eq!(reader.transport().fetches.last(), Some(&(200, 64)));
}

#[test]
fn test_window_reads_are_idempotent() {
    let mut reader = scripted_reader(100_000);
    reader.read(1000, 100).unwrap();
    reader.read(1100, 100).unwrap();
    let window = reader.window_range();
    assert_eq!(window, Some((1100, 1300)));

    let a = reader.read(1150, 50).unwrap();
    let b = reader.read(1150, 50).unwrap();
    assert_eq!(a, b);
    assert_eq!(&a[..], &pattern(100_000)[1150..1200]);
    assert_eq!(reader.window_range(), window);
    assert_eq!(reader.transport().fetches.len(), 2);
}

#[test]
fn test_end_of_file_clamping() {
    let mut reader = scripted_reader(1000);
    assert_eq!(reader.read(990, 50).unwrap().len(), 10);
    assert!(reader.read(1000, 1).unwrap().is_empty());
    assert!(reader.read(5000, 10).unwrap().is_empty());
    assert!(reader.read(300, 0).unwrap().is_empty());

    // Growth never asks past the last byte.
    let mut reader = scripted_reader(1000);
    for _ in 0..6 {
        let next = reader.prefetch_state().expected_pos.max(600);
        reader.read(next, 64).unwrap();
    }
    assert!(reader
        .transport()
        .fetches
        .iter()
        .all(|&(pos, len)| pos + len <= 1000));
}

#[test]
fn test_read_straddling_header_boundary() {
    let mut reader = scripted_reader(1000);
    let data = reader.read(90, 20).unwrap();
    assert_eq!(&data[..], &pattern(1000)[90..110]);
    assert_eq!(reader.transport().fetches, vec![(90, 20)]);
    assert!(!reader.header_cached());
}

#[test]
fn test_short_response_is_an_error() {
    let mut transport_reader = RangeReader::new(ScriptedTransport {
        truncate_replies: true,
        ..ScriptedTransport::new(pattern(10_000))
    });
    let err = transport_reader.read(5000, 400).unwrap_err();
    assert!(matches!(err, ReadError::RangeFetchFailed { pos: 5000, .. }));
    assert_eq!(transport_reader.window_range(), None);

    let err = transport_reader.read(0, 10).unwrap_err();
    assert!(matches!(err, ReadError::RangeFetchFailed { pos: 0, len: 100, .. }));
    assert!(!transport_reader.header_cached());
}

#[test]
fn test_size_failure_is_not_sticky() {
    let mut reader = RangeReader::new(ScriptedTransport {
        failing_probes: 2,
        ..ScriptedTransport::new(pattern(700))
    });

    assert_eq!(ByteSource::size(&mut reader), -1);
    assert!(matches!(
        reader.read(0, 10),
        Err(ReadError::FetchFailed { .. })
    ));
    assert_eq!(ByteSource::size(&mut reader), 700);
    assert_eq!(reader.read(0, 10).unwrap().len(), 10);

    // Size is remembered once known.
    ByteSource::size(&mut reader);
    assert_eq!(reader.transport().probes, 3);
}

#[test]
fn test_file_shorter_than_header() {
    let mut reader = scripted_reader(40);
    let data = reader.read(0, 100).unwrap();
    assert_eq!(&data[..], &pattern(40)[..]);
    assert_eq!(reader.transport().fetches, vec![(0, 40)]);

    assert_eq!(&reader.read(30, 5).unwrap()[..], &pattern(40)[30..35]);
    assert_eq!(reader.transport().fetches.len(), 1);
}
