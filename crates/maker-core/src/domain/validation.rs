use crate::domain::{
    entities::{Template, TemplateCatalog},
    error::DomainError,
    value_objects::WorkerCount,
};

/// Centralized domain validation.
///
/// All pre-run checks live here, not scattered across services.
pub struct DomainValidator;

impl DomainValidator {
    pub fn validate_template(template: &Template) -> Result<(), DomainError> {
        template.validate()
    }

    pub fn validate_worker_count(requested: usize, max: usize) -> Result<WorkerCount, DomainError> {
        WorkerCount::try_new(requested, max)
    }

    pub fn validate_prompt(prompt: &str) -> Result<(), DomainError> {
        if prompt.trim().is_empty() {
            return Err(DomainError::EmptyPrompt);
        }
        Ok(())
    }

    /// Resolve `template` and check it produces `language`.
    pub fn resolve_template<'a>(
        catalog: &'a TemplateCatalog,
        template: &str,
        language: &str,
    ) -> Result<&'a Template, DomainError> {
        let resolved = catalog.resolve(template)?;
        if !resolved.supports_language(language) {
            return Err(DomainError::UnsupportedLanguage {
                language: language.to_string(),
                template: template.to_string(),
            });
        }
        Ok(resolved)
    }
}
