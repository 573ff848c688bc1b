//! Template aggregate.
//!
//! A [`Template`] is a named blueprint for a target project type: which files
//! exist, in which order they are listed, and what each one should contain.
//! File content is either an *instruction* for the generation backend or
//! *static* text written verbatim.
//!
//! ```text
//! Template (Aggregate Root)
//! ├── name, description, language
//! ├── conventions (extra system-prompt guidance)
//! └── Vec<FileSpec>
//!      ├── path (RelativePath, unique)
//!      └── FileContent::{Instruction, Static}
//! ```
//!
//! Templates are immutable once built. The only way to create one is
//! through [`TemplateBuilder`], which validates on `build()`.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::domain::{entities::common::RelativePath, error::DomainError};

/// What a single file should contain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum FileContent {
    /// Sub-prompt sent to the generation backend for this file.
    Instruction(String),
    /// Fixed text, written without calling the backend.
    Static(String),
}

impl FileContent {
    pub fn is_static(&self) -> bool {
        matches!(self, Self::Static(_))
    }
}

/// One generation unit within a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSpec {
    pub path: RelativePath,
    pub content: FileContent,
}

impl FileSpec {
    /// File generated from an instruction.
    pub fn generated(path: impl Into<RelativePath>, instruction: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: FileContent::Instruction(instruction.into()),
        }
    }

    /// File with fixed content.
    pub fn fixed(path: impl Into<RelativePath>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: FileContent::Static(content.into()),
        }
    }
}

/// Named blueprint for a project type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Template {
    name: String,
    description: String,
    language: String,
    conventions: Option<String>,
    files: Vec<FileSpec>,
}

impl Template {
    pub fn builder() -> TemplateBuilder {
        TemplateBuilder::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Lowercase language tag, e.g. `go`, `rust`, `typescript`.
    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn conventions(&self) -> Option<&str> {
        self.conventions.as_deref()
    }

    /// File specs in registration order.
    pub fn files(&self) -> &[FileSpec] {
        &self.files
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Whether this template produces code in `language` (case-insensitive).
    pub fn supports_language(&self, language: &str) -> bool {
        self.language.eq_ignore_ascii_case(language.trim())
    }

    /// Validate template invariants.
    ///
    /// - name and language are non-empty
    /// - at least one file
    /// - every path is unique
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::MissingRequiredField { field: "name" });
        }
        if self.language.trim().is_empty() {
            return Err(DomainError::MissingRequiredField { field: "language" });
        }
        if self.files.is_empty() {
            return Err(DomainError::EmptyTemplate {
                template: self.name.clone(),
            });
        }

        let mut seen = HashSet::with_capacity(self.files.len());
        for spec in &self.files {
            if !seen.insert(spec.path.as_path()) {
                return Err(DomainError::DuplicatePath {
                    template: self.name.clone(),
                    path: spec.path.to_string(),
                });
            }
        }

        Ok(())
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.language)
    }
}

/// Builder for [`Template`].
#[derive(Debug, Default)]
pub struct TemplateBuilder {
    name: Option<String>,
    description: Option<String>,
    language: Option<String>,
    conventions: Option<String>,
    files: Vec<FileSpec>,
}

impl TemplateBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn conventions(mut self, conventions: impl Into<String>) -> Self {
        self.conventions = Some(conventions.into());
        self
    }

    pub fn file(mut self, spec: FileSpec) -> Self {
        self.files.push(spec);
        self
    }

    pub fn files(mut self, specs: impl IntoIterator<Item = FileSpec>) -> Self {
        self.files.extend(specs);
        self
    }

    pub fn build(self) -> Result<Template, DomainError> {
        let template = Template {
            name: self
                .name
                .ok_or(DomainError::MissingRequiredField { field: "name" })?,
            description: self.description.unwrap_or_default(),
            language: self
                .language
                .ok_or(DomainError::MissingRequiredField { field: "language" })?
                .trim()
                .to_ascii_lowercase(),
            conventions: self.conventions.filter(|c| !c.trim().is_empty()),
            files: self.files,
        };

        template.validate()?;
        Ok(template)
    }
}
