// Shared-memory rendezvous channel: wire layout, the wait/notify region and its serving peer.

pub mod layout;
pub mod responder;
pub mod sync_channel;
