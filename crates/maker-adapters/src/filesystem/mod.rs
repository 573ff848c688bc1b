//! [`Filesystem`](maker_core::application::Filesystem) implementations.
//!
//! The agent is the only writer during a run, so neither adapter locks
//! across calls.

mod local;
mod memory;

pub use local::LocalFilesystem;
pub use memory::MemoryFilesystem;
