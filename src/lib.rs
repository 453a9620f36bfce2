//! Random-access reads over large files that are never fully downloaded.
//!
//! A [`RangeReader`] serves `read(pos, len)` from a 100-byte header cache, then from the
//! current prefetch window, and otherwise fetches a new window through a
//! [`RangeTransport`]: HTTP range requests ([`HttpTransport`]) or a shared-memory
//! rendezvous with a peer thread ([`SharedMemoryTransport`] over a [`SyncChannel`]).
//! The peer side of the channel is [`ChannelResponder`], fed by any [`ByteBackend`].

pub mod api;
pub mod backend;
pub mod channel;
pub mod config;
pub mod engine;
pub mod error;
pub mod source;

pub use api::logging::{init_tracing, init_tracing_with};
pub use api::node::{BlobSource, FileNode, RangeRequestSource, SharedMemorySource};
pub use backend::traits::ByteBackend;
pub use channel::layout::{ChannelRequest, ReadyState};
pub use channel::responder::ChannelResponder;
pub use channel::sync_channel::SyncChannel;
pub use config::ReaderConfig;
pub use engine::reader::RangeReader;
pub use error::{ReadError, ReadResult};
pub use source::http_source::HttpTransport;
pub use source::shm_source::SharedMemoryTransport;
pub use source::traits::{ByteSource, RangeTransport};
