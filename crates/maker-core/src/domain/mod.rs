// ============================================================================
//  CLEAN MODULE BOUNDARIES
// ============================================================================

//! Core domain layer for Maker.
//!
//! Pure data and rules: templates and the catalog that holds them, the
//! tasks a run is split into, the run record itself, and the progress
//! events it emits. No I/O lives here; the filesystem, the generation
//! backend and event delivery are ports in the application layer.
//!
// Public API - what the world sees
pub mod entities;
pub mod error;
pub mod value_objects;

// Private implementation details - not visible outside domain
mod validation;

// Re-exports for convenience
pub use entities::{
    catalog::{CatalogBuilder, TemplateCatalog},
    common::RelativePath,
    event::{FailedFile, ProgressEvent, RunSummary},
    prompt::PromptContext,
    run::{ProjectRun, RunState},
    task::{FailureKind, GenerationError, GenerationTask, TaskFailure, TaskId, TaskResult},
    template::{FileContent, FileSpec, Template, TemplateBuilder},
};

pub use error::{DomainError, ErrorCategory};

pub use value_objects::{ProjectName, WorkerCount};

pub use validation::DomainValidator;
