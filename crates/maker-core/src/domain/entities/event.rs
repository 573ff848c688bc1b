//! Progress events emitted during a run.
//!
//! The serialized form is the wire protocol of the streaming endpoint: one
//! JSON object per event, discriminated by `type`.
//!
//! ```json
//! {"type":"start","runId":"…","project":"books","template":"go-gin","total":5}
//! {"type":"file","path":"main.go","completed":1,"total":5}
//! {"type":"error","path":"go.mod","error":"…","kind":"transient","completed":2,"total":5}
//! {"type":"complete","summary":{…},"download":"/download/books"}
//! ```

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use uuid::Uuid;

use super::{
    common::RelativePath,
    run::RunState,
    task::{FailureKind, TaskFailure},
};

/// A file that did not make it to disk, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedFile {
    pub path: RelativePath,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<FailureKind>,
}

impl FailedFile {
    pub fn new(path: RelativePath, failure: &TaskFailure) -> Self {
        Self {
            path,
            error: failure.to_string(),
            kind: failure.kind(),
        }
    }
}

impl fmt::Display for FailedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.error)
    }
}

/// Final accounting of a run, carried by the terminal event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub run_id: Uuid,
    pub status: RunState,
    pub total: usize,
    pub written: Vec<RelativePath>,
    pub failed: Vec<FailedFile>,
    pub output_dir: PathBuf,
    pub elapsed_ms: u64,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.written.len()
    }

    pub fn is_success(&self) -> bool {
        self.status == RunState::Completed
    }
}

/// One observable step of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum ProgressEvent {
    /// Tasks are about to be dispatched.
    Start {
        run_id: Uuid,
        project: String,
        template: String,
        total: usize,
    },
    /// A file was written.
    File {
        path: RelativePath,
        completed: usize,
        total: usize,
    },
    /// A file failed to generate or write.
    Error {
        path: RelativePath,
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        kind: Option<FailureKind>,
        completed: usize,
        total: usize,
    },
    /// The run finished, successfully or not.
    Complete {
        summary: RunSummary,
        #[serde(skip_serializing_if = "Option::is_none")]
        download: Option<String>,
    },
}

impl ProgressEvent {
    /// Wire name of the event type.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Start { .. } => "start",
            Self::File { .. } => "file",
            Self::Error { .. } => "error",
            Self::Complete { .. } => "complete",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. })
    }
}
