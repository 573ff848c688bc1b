//! Prompt construction for generation tasks.
//!
//! The system prompt carries template and language conventions and is the
//! same for every file of a run. The user prompt is per file: the project
//! description, the file's instruction, and the base package.

use super::template::{FileContent, FileSpec, Template};
use crate::domain::value_objects::ProjectName;

/// Inputs shared by every prompt of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptContext {
    prompt: String,
    base_package: String,
    project_name: ProjectName,
}

impl PromptContext {
    pub fn new(
        prompt: impl Into<String>,
        base_package: impl Into<String>,
        project_name: ProjectName,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            base_package: base_package.into(),
            project_name,
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn base_package(&self) -> &str {
        &self.base_package
    }

    pub fn project_name(&self) -> &ProjectName {
        &self.project_name
    }

    pub fn system_prompt(&self, template: &Template) -> String {
        let mut out = format!(
            "You are an expert {language} developer generating one file of a {description} project.\n\
             Respond with the complete contents of the requested file only: \
             no explanations and no markdown code fences.\n\
             Follow idiomatic {language} conventions and keep imports consistent \
             with the base package.",
            language = template.language(),
            description = if template.description().is_empty() {
                template.name()
            } else {
                template.description()
            },
        );

        if let Some(conventions) = template.conventions() {
            out.push_str("\n\nProject conventions:\n");
            out.push_str(conventions);
        }

        out
    }

    pub fn user_prompt(&self, template: &Template, spec: &FileSpec) -> String {
        let instruction = match &spec.content {
            FileContent::Instruction(i) => i.as_str(),
            FileContent::Static(_) => "Static file; content is fixed.",
        };

        let siblings = template
            .files()
            .iter()
            .map(|f| format!("- {}", f.path))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "Project description: {prompt}\n\
             Project name: {name}\n\
             Base package: {base}\n\
             \n\
             Files in this project:\n{siblings}\n\
             \n\
             Generate the file `{path}`.\n\
             Instructions: {instruction}",
            prompt = self.prompt.trim(),
            name = self.project_name,
            base = self.base_package,
            path = spec.path,
        )
    }
}
