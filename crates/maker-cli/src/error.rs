//! Error handling for the Maker CLI.
//!
//! Every failure carries a user-facing message and actionable suggestions.
//! Categories drive styling and log severity; the process exit code is 1 for
//! every failure.

use std::error::Error;

use owo_colors::OwoColorize;
use thiserror::Error;

use maker_core::domain::DomainError;
use maker_core::error::{ErrorCategory as CoreCategory, MakerError};

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    /// No key from `--openai-key` or `OPENAI_API_KEY`.
    #[error("Missing API key")]
    MissingApiKey,

    /// No positional words after the flags.
    #[error("Missing project description")]
    MissingPrompt,

    /// A flag value that parsed but is not usable.
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// A configuration file could not be read or parsed.
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn Error + Send + Sync>>,
    },

    /// An error propagated from `maker-core`.
    #[error("Generation failed: {0}")]
    Core(#[from] MakerError),

    /// Terminal output or runtime setup failed.
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<DomainError> for CliError {
    fn from(err: DomainError) -> Self {
        Self::Core(err.into())
    }
}

impl CliError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::MissingApiKey => vec![
                "Pass the key with -openai-key <KEY>".into(),
                "Or set the OPENAI_API_KEY environment variable (a .env file works too)".into(),
            ],
            Self::MissingPrompt => vec![
                "Describe the project after the flags".into(),
                "Example: maker --template go-gin CRUD API for books".into(),
            ],
            Self::InvalidInput { message } => vec![
                format!("Check your input: {message}"),
                "Use --help for usage information".into(),
            ],
            Self::Config { .. } => vec![
                format!(
                    "Check your config file (default: {})",
                    crate::config::AppConfig::config_path().display()
                ),
                "Run with -vv to see the underlying parse error".into(),
            ],
            Self::Core(core) => {
                let mut out = core.suggestions();
                if core.is_config_error() {
                    out.push("List what is available: maker --list-templates".into());
                }
                out
            }
            Self::Io { .. } => vec![
                "Check file permissions and available disk space".into(),
            ],
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingApiKey | Self::MissingPrompt | Self::InvalidInput { .. } => {
                ErrorCategory::UserError
            }
            Self::Config { .. } => ErrorCategory::Configuration,
            Self::Core(core) => match core.category() {
                CoreCategory::Validation => ErrorCategory::UserError,
                CoreCategory::NotFound => ErrorCategory::NotFound,
                CoreCategory::Configuration => ErrorCategory::Configuration,
                CoreCategory::Generation | CoreCategory::Cancelled => ErrorCategory::Generation,
                CoreCategory::State | CoreCategory::Internal => ErrorCategory::Internal,
            },
            Self::Io { .. } => ErrorCategory::Internal,
        }
    }

    /// Exit code to pass to the OS. Every failure is 1.
    pub fn exit_code(&self) -> u8 {
        1
    }

    /// Format the error for display with colors and suggestions.
    pub fn format_colored(&self, verbose: bool) -> String {
        let mut output = format!("\n{} {}\n\n", "✗".red().bold(), "Error:".red().bold());
        output.push_str(&format!("  {}\n", self.to_string().red()));

        if verbose {
            let mut source = self.source();
            while let Some(err) = source {
                output.push_str(&format!(
                    "\n  {} {}\n",
                    "→".dimmed(),
                    err.to_string().dimmed()
                ));
                source = err.source();
            }
        }

        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            output.push_str(&format!("\n{}\n", "Suggestions:".yellow().bold()));
            for suggestion in suggestions {
                output.push_str(&format!("  {suggestion}\n"));
            }
        }

        if !verbose {
            output.push_str(&format!(
                "\n{} {}\n",
                "\u{2139}".blue(),
                "Use -v / --verbose for more details.".dimmed(),
            ));
        }

        output
    }

    /// Plain-text version of [`Self::format_colored`]; no ANSI codes.
    pub fn format_plain(&self, verbose: bool) -> String {
        let mut out = format!("\nError: {self}\n");

        if verbose {
            let mut src = self.source();
            while let Some(err) = src {
                out.push_str(&format!("  Caused by: {err}\n"));
                src = err.source();
            }
        }

        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            out.push_str("\nSuggestions:\n");
            for s in &suggestions {
                out.push_str(&format!("  {s}\n"));
            }
        }

        if !verbose {
            out.push_str("\nUse -v / --verbose for more details.\n");
        }

        out
    }

    /// Log the error using tracing.
    pub fn log(&self) {
        match self.category() {
            ErrorCategory::UserError => tracing::warn!(error = %self, "user error"),
            ErrorCategory::NotFound => tracing::warn!(error = %self, "not found"),
            ErrorCategory::Generation => tracing::warn!(error = %self, "generation failed"),
            ErrorCategory::Configuration => tracing::error!(error = %self, "configuration error"),
            ErrorCategory::Internal => tracing::error!(error = %self, "internal error"),
        }

        if let Some(source) = self.source() {
            tracing::debug!(cause = %source, "caused by");
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    UserError,
    NotFound,
    /// The run happened but not every file made it.
    Generation,
    Configuration,
    Internal,
}
