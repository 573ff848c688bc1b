//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what the application needs from external systems.
//! The `maker-adapters` crate provides implementations.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{GenerationError, ProgressEvent};
use crate::error::MakerResult;

/// Port for filesystem operations.
///
/// Implemented by:
/// - `maker_adapters::filesystem::LocalFilesystem` (production)
/// - `maker_adapters::filesystem::MemoryFilesystem` (testing)
///
/// Only the orchestrator writes through this port, from a single task, so
/// implementations need `Send + Sync` for sharing but never see concurrent
/// writes to the same path.
pub trait Filesystem: Send + Sync {
    /// Create a directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> MakerResult<()>;

    /// Write content to a file, replacing any existing file.
    fn write_file(&self, path: &Path, content: &str) -> MakerResult<()>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;
}

/// Port for the text-generation backend.
///
/// A single capability: system instruction + user instruction in, text out.
/// Implementations must be callable from many workers at once.
///
/// Implemented by:
/// - `maker_adapters::generation::HttpGenerationClient` (provider HTTP APIs)
/// - `maker_adapters::generation::ScriptedClient` (deterministic testing)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Generate text. Errors must be classified transient or fatal.
    async fn query(&self, system_prompt: &str, prompt: &str) -> Result<String, GenerationError>;
}

/// Why an event could not be delivered.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// The consumer went away (e.g. the WebSocket closed).
    #[error("event sink closed")]
    Closed,

    /// Delivery failed for another reason.
    #[error("event delivery failed: {0}")]
    Delivery(String),
}

/// Port for progress event delivery.
///
/// Called in strict emission order from a single forwarding task. A failed
/// delivery is reported back but never stops the run.
///
/// Implemented by:
/// - `maker_adapters::sink::LogSink` (tracing lines)
/// - `maker_adapters::sink::RecordingSink` (testing)
/// - the CLI console sink and the server WebSocket sink
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: &ProgressEvent) -> Result<(), SinkError>;

    /// Push out anything buffered. Called once when the agent stops.
    async fn flush(&self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Port for archiving a finished output directory.
///
/// Implemented by:
/// - `maker_adapters::packager::ZipPackager`
pub trait Packager: Send + Sync {
    /// Archive every file under `source_dir`, returning the archive bytes.
    fn package(&self, source_dir: &Path) -> MakerResult<Vec<u8>>;

    /// File extension of produced archives, without the dot.
    fn extension(&self) -> &'static str;
}
