// ============================================================================
// domain/error.rs - DOMAIN ERRORS
// ============================================================================

use thiserror::Error;

/// Root domain error type.
///
/// All errors are:
/// - Cloneable (they travel inside task results and events)
/// - Categorizable (for CLI display)
/// - Actionable (provides suggestions)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Validation Errors (400-level equivalent)
    // ========================================================================
    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    #[error("Template '{template}' has no files")]
    EmptyTemplate { template: String },

    #[error("Duplicate path in template '{template}': {path}")]
    DuplicatePath { template: String, path: String },

    #[error("Duplicate template name: {name}")]
    DuplicateTemplate { name: String },

    #[error("Absolute paths not allowed: {path}")]
    AbsolutePathNotAllowed { path: String },

    #[error("Path escapes the project root: {path}")]
    PathEscapesRoot { path: String },

    #[error("worker count must be between 1 and {max}, got {requested}")]
    InvalidWorkerCount { requested: usize, max: usize },

    #[error("Invalid project name '{name}': {reason}")]
    InvalidProjectName { name: String, reason: String },

    #[error("Prompt must not be empty")]
    EmptyPrompt,

    // ========================================================================
    // Not Found Errors (404-level equivalent)
    // ========================================================================
    #[error("Template not found: {name}")]
    TemplateNotFound { name: String },

    #[error("Language '{language}' is not supported by template '{template}'")]
    UnsupportedLanguage { language: String, template: String },

    // ========================================================================
    // Constraint Violations
    // ========================================================================
    #[error("Required field missing: {field}")]
    MissingRequiredField { field: &'static str },
}

impl DomainError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::TemplateNotFound { name } => vec![
                format!("No template is registered as '{name}'"),
                "Try: maker --list-templates".into(),
            ],
            Self::UnsupportedLanguage { language, template } => vec![
                format!("Template '{template}' does not generate {language} code"),
                "Try: maker --list-templates to see each template's language".into(),
                "Or: maker --list-languages".into(),
            ],
            Self::InvalidWorkerCount { max, .. } => vec![
                format!("Pass --worker-count between 1 and {max}"),
            ],
            Self::InvalidProjectName { .. } => vec![
                "Use letters, digits, '-', '_' and '.' only".into(),
                "Examples: books-api, my_app".into(),
            ],
            Self::EmptyPrompt => vec![
                "Describe the project after the flags".into(),
                "Example: maker --template go-gin CRUD API for books".into(),
            ],
            Self::EmptyTemplate { template } => vec![
                format!("Template '{template}' is corrupted"),
                "Fix the template manifest or use a different template".into(),
            ],
            _ => vec!["See documentation for more details".into()],
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::TemplateNotFound { .. } | Self::UnsupportedLanguage { .. } => {
                ErrorCategory::NotFound
            }
            Self::InvalidWorkerCount { .. }
            | Self::InvalidProjectName { .. }
            | Self::EmptyPrompt
            | Self::MissingRequiredField { .. } => ErrorCategory::Validation,
            Self::InvalidTemplate(_)
            | Self::EmptyTemplate { .. }
            | Self::DuplicatePath { .. }
            | Self::DuplicateTemplate { .. }
            | Self::AbsolutePathNotAllowed { .. }
            | Self::PathEscapesRoot { .. } => ErrorCategory::InvalidTemplate,
        }
    }

    /// Whether this error is a configuration problem detected before any
    /// generation task runs.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::TemplateNotFound { .. }
                | Self::UnsupportedLanguage { .. }
                | Self::InvalidWorkerCount { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    InvalidTemplate,
    NotFound,
}
