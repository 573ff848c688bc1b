//! Application layer errors.
//!
//! These errors represent failures in orchestration, not business rules.
//! Rule violations are `DomainError` from `crate::domain`.

use std::path::PathBuf;
use thiserror::Error;

use crate::application::services::AgentState;
use crate::domain::FailedFile;
use crate::error::ErrorCategory;

/// Errors that occur while driving a run.
#[derive(Debug, Error, Clone)]
pub enum ApplicationError {
    /// Operation not allowed in the agent's current lifecycle state.
    #[error("cannot {operation} while agent is {state}")]
    InvalidState {
        operation: &'static str,
        state: AgentState,
    },

    /// The agent already performed (or is performing) its one run.
    #[error("agent has already run; create a new agent for another run")]
    AlreadyRunning,

    /// At least one file failed; the rest were written.
    #[error("{} of {total} files failed: {}", .failed.len(), summarize(.failed))]
    PartialGeneration {
        failed: Vec<FailedFile>,
        succeeded: usize,
        total: usize,
    },

    /// The run was stopped from outside before it drained.
    #[error("run cancelled after {completed} of {total} files")]
    Cancelled { completed: usize, total: usize },

    /// Filesystem operation failed.
    #[error("Filesystem error at {path}: {reason}")]
    FilesystemError { path: PathBuf, reason: String },

    /// Archiving an output directory failed.
    #[error("Packaging failed for {path}: {reason}")]
    PackagingFailed { path: PathBuf, reason: String },
}

fn summarize(failed: &[FailedFile]) -> String {
    failed
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ApplicationError {
    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::PartialGeneration { failed, .. } => {
                let mut out = vec!["Failed files:".to_string()];
                out.extend(failed.iter().map(|f| format!("  • {f}")));
                if failed.iter().any(|f| f.kind == Some(crate::domain::FailureKind::Transient)) {
                    out.push("Transient failures may succeed if you run again".into());
                }
                if failed.iter().any(|f| f.kind == Some(crate::domain::FailureKind::Fatal)) {
                    out.push("Fatal failures usually mean a bad API key or model name".into());
                }
                out
            }
            Self::FilesystemError { path, .. } => vec![
                format!("Failed to access: {}", path.display()),
                "Check that you have write permissions".into(),
                "Check available disk space".into(),
            ],
            Self::InvalidState { .. } | Self::AlreadyRunning => vec![
                "Call start() once, then generate_code() once per agent".into(),
            ],
            Self::Cancelled { .. } => vec![
                "Files written before cancellation were kept".into(),
            ],
            Self::PackagingFailed { .. } => vec![
                "Make sure the run completed and the output directory exists".into(),
            ],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidState { .. } | Self::AlreadyRunning => ErrorCategory::State,
            Self::PartialGeneration { .. } => ErrorCategory::Generation,
            Self::Cancelled { .. } => ErrorCategory::Cancelled,
            Self::FilesystemError { .. } | Self::PackagingFailed { .. } => ErrorCategory::Internal,
        }
    }
}
