//! Concrete implementations of the `maker-core` ports.
//!
//! Network, disk and archive code lives here so the core stays free of
//! I/O. The in-memory and scripted variants back the test suites.

pub mod builtin_templates;
pub mod filesystem;
pub mod generation;
pub mod packager;
pub mod sink;
pub mod template_loader;

pub use builtin_templates::load_catalog;
pub use filesystem::{LocalFilesystem, MemoryFilesystem};
pub use generation::{ClientConfig, HttpGenerationClient, Provider, ScriptedClient};
pub use packager::ZipPackager;
pub use sink::{LogSink, RecordingSink};
