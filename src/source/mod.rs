// Consumer-side transports: pluggable byte-range backends for the read engine.

pub mod http_source;
pub mod shm_source;
pub mod traits;
