use super::DomainError;
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// A filesystem path guaranteed to stay inside the project root.
///
/// Invariant: never absolute, never contains `..`. Enforced at construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelativePath(PathBuf);

impl RelativePath {
    /// Create a new relative path.
    ///
    /// # Panics
    /// Panics if the path is absolute or escapes the root (use `try_new` for
    /// fallible).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        match Self::try_new(path) {
            Ok(p) => p,
            Err(e) => panic!("invalid RelativePath: {e}"),
        }
    }

    /// Fallible constructor.
    ///
    /// Backslashes are normalised to `/` so manifests written on Windows
    /// produce the same paths.
    pub fn try_new(path: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let raw = path.into();
        let path = PathBuf::from(raw.to_string_lossy().replace('\\', "/"));

        if path.is_absolute() || path.has_root() {
            return Err(DomainError::AbsolutePathNotAllowed {
                path: path.display().to_string(),
            });
        }

        if path.components().any(|c| matches!(c, Component::ParentDir)) {
            return Err(DomainError::PathEscapesRoot {
                path: path.display().to_string(),
            });
        }

        // `./main.go`, `main.go/` and `a//main.go` name the same file as
        // their plain spelling, so only the normal segments are kept.
        let segments: Vec<_> = path
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        if segments.is_empty() {
            return Err(DomainError::MissingRequiredField { field: "path" });
        }

        Ok(Self(PathBuf::from(segments.join("/"))))
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        self.0.to_str().unwrap_or("")
    }

    /// Resolve against a root directory.
    pub fn under(&self, root: &Path) -> PathBuf {
        root.join(&self.0)
    }
}

impl AsRef<Path> for RelativePath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl From<&str> for RelativePath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl Serialize for RelativePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
