// Surface handed to the filesystem adapter.

pub mod logging;
pub mod node;
