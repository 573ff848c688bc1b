//! Domain value objects: WorkerCount, ProjectName.
//!
//! Plain validated values. Construction is the only place validation
//! happens; once you hold one, it is valid.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

// ── WorkerCount ───────────────────────────────────────────────────────────────

/// Number of concurrent generation workers, within `1..=max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct WorkerCount(usize);

impl WorkerCount {
    pub const DEFAULT: usize = 4;
    pub const DEFAULT_MAX: usize = 8;

    /// Validate against an explicit upper bound.
    pub fn try_new(requested: usize, max: usize) -> Result<Self, DomainError> {
        if requested == 0 || requested > max {
            return Err(DomainError::InvalidWorkerCount { requested, max });
        }
        Ok(Self(requested))
    }

    pub const fn get(self) -> usize {
        self.0
    }

    /// Workers actually worth spawning for `tasks` tasks.
    pub fn effective(self, tasks: usize) -> usize {
        self.0.min(tasks).max(1)
    }
}

impl Default for WorkerCount {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl fmt::Display for WorkerCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── ProjectName ───────────────────────────────────────────────────────────────

/// Name of the generated project; also its directory under the output root.
///
/// Restricted to a single path segment so it can never point outside the
/// output root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProjectName(String);

impl ProjectName {
    pub const DEFAULT: &'static str = "project";

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ProjectName {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl FromStr for ProjectName {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        let invalid = |reason: &str| DomainError::InvalidProjectName {
            name: s.to_string(),
            reason: reason.to_string(),
        };

        if name.is_empty() {
            return Err(invalid("name is empty"));
        }
        if name == "." || name == ".." || name.starts_with('.') {
            return Err(invalid("name must not start with '.'"));
        }
        if let Some(c) = name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
        {
            return Err(invalid(&format!("character '{c}' is not allowed")));
        }

        Ok(Self(name.to_string()))
    }
}

impl TryFrom<String> for ProjectName {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ProjectName> for String {
    fn from(value: ProjectName) -> Self {
        value.0
    }
}

impl fmt::Display for ProjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_count_bounds() {
        assert!(WorkerCount::try_new(0, 8).is_err());
        assert!(WorkerCount::try_new(9, 8).is_err());
        assert_eq!(WorkerCount::try_new(8, 8).unwrap().get(), 8);
        assert_eq!(WorkerCount::try_new(1, 8).unwrap().get(), 1);
    }

    #[test]
    fn worker_count_default_is_four() {
        assert_eq!(WorkerCount::default().get(), 4);
    }

    #[test]
    fn effective_workers_never_exceed_tasks() {
        let n = WorkerCount::try_new(8, 8).unwrap();
        assert_eq!(n.effective(3), 3);
        assert_eq!(n.effective(20), 8);
        assert_eq!(n.effective(0), 1);
    }

    #[test]
    fn project_name_accepts_common_forms() {
        for ok in ["books-api", "my_app", "app2", "v1.2"] {
            assert!(ok.parse::<ProjectName>().is_ok(), "{ok}");
        }
    }

    #[test]
    fn project_name_rejects_traversal_and_separators() {
        for bad in ["", "..", ".hidden", "a/b", "a\\b", "my app"] {
            assert!(bad.parse::<ProjectName>().is_err(), "{bad:?}");
        }
    }
}
