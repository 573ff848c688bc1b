//! A single end-to-end execution of code generation.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::value_objects::{ProjectName, WorkerCount};

/// Lifecycle of a [`ProjectRun`].
///
/// Transitions only move forward:
/// `Pending → Running → {Completed | Failed | Cancelled}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl RunState {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    pub const fn can_transition_to(self, next: RunState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running)
                | (Self::Pending, Self::Failed)
                | (Self::Pending, Self::Cancelled)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Failed)
                | (Self::Running, Self::Cancelled)
        )
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record of one run: what was asked for and where it stands.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRun {
    pub id: Uuid,
    pub prompt: String,
    pub template: String,
    pub base_package: String,
    pub worker_count: WorkerCount,
    pub output_root: PathBuf,
    pub project_name: ProjectName,
    state: RunState,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl ProjectRun {
    pub fn new(
        prompt: impl Into<String>,
        template: impl Into<String>,
        base_package: impl Into<String>,
        worker_count: WorkerCount,
        output_root: impl Into<PathBuf>,
        project_name: ProjectName,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            prompt: prompt.into(),
            template: template.into(),
            base_package: base_package.into(),
            worker_count,
            output_root: output_root.into(),
            project_name,
            state: RunState::Pending,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Directory that receives this run's files.
    pub fn project_dir(&self) -> PathBuf {
        self.output_root.join(self.project_name.as_str())
    }

    /// Move to `next`, stamping timestamps. Returns `false` (and leaves the
    /// run untouched) for a backwards or repeated transition.
    pub fn transition(&mut self, next: RunState) -> bool {
        if !self.state.can_transition_to(next) {
            return false;
        }

        let now = Utc::now();
        if next == RunState::Running {
            self.started_at = Some(now);
        }
        if next.is_terminal() {
            self.finished_at = Some(now);
        }
        self.state = next;
        true
    }

    /// Wall-clock duration of the run so far, in milliseconds.
    pub fn elapsed_ms(&self) -> u64 {
        let start = self.started_at.unwrap_or(self.created_at);
        let end = self.finished_at.unwrap_or_else(Utc::now);
        (end - start).num_milliseconds().max(0) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run() -> ProjectRun {
        ProjectRun::new(
            "prompt",
            "go-gin",
            "github.com/user/app",
            WorkerCount::default(),
            "/tmp/out",
            "books".parse().unwrap(),
        )
    }

    #[test]
    fn starts_pending() {
        let r = run();
        assert_eq!(r.state(), RunState::Pending);
        assert!(r.started_at.is_none());
    }

    #[test]
    fn forward_transitions_stamp_times() {
        let mut r = run();
        assert!(r.transition(RunState::Running));
        assert!(r.started_at.is_some());
        assert!(r.transition(RunState::Completed));
        assert!(r.finished_at.is_some());
    }

    #[test]
    fn terminal_states_are_final() {
        let mut r = run();
        r.transition(RunState::Running);
        r.transition(RunState::Failed);
        assert!(!r.transition(RunState::Running));
        assert!(!r.transition(RunState::Completed));
        assert_eq!(r.state(), RunState::Failed);
    }

    #[test]
    fn cannot_skip_back_to_pending() {
        let mut r = run();
        r.transition(RunState::Running);
        assert!(!r.transition(RunState::Pending));
        assert!(!r.transition(RunState::Running));
    }

    #[test]
    fn project_dir_joins_name() {
        assert_eq!(run().project_dir(), PathBuf::from("/tmp/out/books"));
    }
}
