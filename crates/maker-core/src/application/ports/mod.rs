//! Traits the agent calls and adapters implement.
//!
//! All four are driven ports: the agent decides when to generate, write,
//! emit or package. The agent itself is what the CLI and server drive.

pub mod output;

pub use output::{EventSink, Filesystem, GenerationClient, Packager, SinkError};

#[cfg(test)]
pub use output::MockGenerationClient;
