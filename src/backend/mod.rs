// Backing stores for the controller side of the sync channel.

pub mod file;
pub mod http;
pub mod memory;
pub mod traits;
