//! Generation tasks and their results.
//!
//! Every [`FileSpec`] of a template becomes exactly one [`GenerationTask`]
//! per run, and every task produces exactly one [`TaskResult`]. Failures are
//! plain values ([`TaskFailure`]) so they travel from workers to the
//! orchestrator like any other result.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use super::{
    common::RelativePath,
    prompt::PromptContext,
    template::{FileContent, FileSpec, Template},
};

/// Index of a task within its run (registration order of the FileSpec).
pub type TaskId = usize;

/// How a generation failure should be treated by whoever reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// Network failure, rate limit, 5xx, timeout. Worth retrying later.
    Transient,
    /// Authentication, malformed request or response. Retrying won't help.
    Fatal,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Transient => "transient",
            Self::Fatal => "fatal",
        })
    }
}

/// Error returned by a generation backend.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{kind} generation error: {message}")]
pub struct GenerationError {
    pub kind: FailureKind,
    pub message: String,
}

impl GenerationError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Transient,
            message: message.into(),
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Fatal,
            message: message.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind == FailureKind::Transient
    }
}

/// Why a single file did not make it to disk.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "stage", rename_all = "lowercase")]
pub enum TaskFailure {
    /// The backend call failed or timed out.
    #[error(transparent)]
    Generation(GenerationError),

    /// Content was generated but could not be persisted.
    #[error("write error: {reason}")]
    Write { reason: String },

    /// The worker holding the task went away without reporting.
    #[error("worker stopped before reporting a result")]
    Lost,
}

impl TaskFailure {
    /// Transient/fatal classification, when the failure came from the backend.
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            Self::Generation(e) => Some(e.kind),
            Self::Write { .. } | Self::Lost => None,
        }
    }
}

impl From<GenerationError> for TaskFailure {
    fn from(e: GenerationError) -> Self {
        Self::Generation(e)
    }
}

/// One unit of work for the worker pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationTask {
    pub id: TaskId,
    pub spec: FileSpec,
    pub system_prompt: String,
    pub user_prompt: String,
}

impl GenerationTask {
    /// Build one task per file spec, preserving template order.
    pub fn plan(template: &Template, ctx: &PromptContext) -> Vec<GenerationTask> {
        let system_prompt = ctx.system_prompt(template);

        template
            .files()
            .iter()
            .enumerate()
            .map(|(id, spec)| GenerationTask {
                id,
                spec: spec.clone(),
                system_prompt: system_prompt.clone(),
                user_prompt: ctx.user_prompt(template, spec),
            })
            .collect()
    }

    pub fn path(&self) -> &RelativePath {
        &self.spec.path
    }

    /// Content known without calling the backend.
    pub fn static_content(&self) -> Option<&str> {
        match &self.spec.content {
            FileContent::Static(s) => Some(s),
            FileContent::Instruction(_) => None,
        }
    }
}

/// Outcome of one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskResult {
    pub task_id: TaskId,
    pub path: RelativePath,
    pub outcome: Result<String, TaskFailure>,
}

impl TaskResult {
    pub fn success(task: &GenerationTask, content: String) -> Self {
        Self {
            task_id: task.id,
            path: task.spec.path.clone(),
            outcome: Ok(content),
        }
    }

    pub fn failure(task: &GenerationTask, failure: impl Into<TaskFailure>) -> Self {
        Self {
            task_id: task.id,
            path: task.spec.path.clone(),
            outcome: Err(failure.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}
