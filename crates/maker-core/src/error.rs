//! The error every public `maker-core` operation returns.

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::{self, DomainError, FailedFile};

#[derive(Debug, Error, Clone)]
pub enum MakerError {
    /// A rule of the domain was broken: unknown template, bad project
    /// name, worker count out of range.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The run itself went wrong: lifecycle misuse, failed files,
    /// cancellation.
    #[error(transparent)]
    Application(#[from] ApplicationError),

    /// An invariant of the agent did not hold.
    #[error("Internal error: {message}. This is a bug, please report it.")]
    Internal { message: String },
}

impl MakerError {
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Domain(e) => e.suggestions(),
            Self::Application(e) => e.suggestions(),
            Self::Internal { .. } => vec![
                "Re-run with -vv and include the log when reporting the problem".into(),
            ],
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Domain(e) => match e.category() {
                domain::ErrorCategory::Validation => ErrorCategory::Validation,
                domain::ErrorCategory::InvalidTemplate => ErrorCategory::Configuration,
                domain::ErrorCategory::NotFound => ErrorCategory::NotFound,
            },
            Self::Application(e) => e.category(),
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Raised before any file was requested, so no event was emitted.
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::Domain(e) if e.is_config_error())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Application(ApplicationError::Cancelled { .. }))
    }

    /// Files that failed, for a run that ended in partial generation.
    pub fn failed_files(&self) -> &[FailedFile] {
        match self {
            Self::Application(ApplicationError::PartialGeneration { failed, .. }) => failed,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    NotFound,
    State,
    Generation,
    Cancelled,
    Configuration,
    Internal,
}

pub type MakerResult<T> = Result<T, MakerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_template_is_a_config_error() {
        let err: MakerError = DomainError::TemplateNotFound { name: "x".into() }.into();
        assert!(err.is_config_error());
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert_eq!(err.to_string(), "Template not found: x");
    }

    #[test]
    fn cancellation_has_its_own_category() {
        let err: MakerError = ApplicationError::Cancelled {
            completed: 1,
            total: 5,
        }
        .into();
        assert!(err.is_cancelled());
        assert!(!err.is_config_error());
        assert_eq!(err.category(), ErrorCategory::Cancelled);
        assert!(err.failed_files().is_empty());
    }

    #[test]
    fn internal_errors_point_at_verbose_logs() {
        let err = MakerError::Internal {
            message: "run missing".into(),
        };
        assert_eq!(err.category(), ErrorCategory::Internal);
        assert!(err.suggestions()[0].contains("-vv"));
    }
}
