//! Immutable template registry.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use super::template::Template;
use crate::domain::error::DomainError;

/// Read-only registry of templates, keyed by name.
///
/// Built once through [`CatalogBuilder`] and shared behind an `Arc`. Listing
/// order is registration order; lookups are by exact name.
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    templates: Vec<Template>,
    index: HashMap<String, usize>,
}

impl TemplateCatalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    /// Templates in registration order.
    pub fn list_templates(&self) -> &[Template] {
        &self.templates
    }

    /// Distinct language tags, sorted.
    pub fn list_languages(&self) -> Vec<String> {
        self.templates
            .iter()
            .map(|t| t.language().to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn resolve(&self, name: &str) -> Result<&Template, DomainError> {
        self.index
            .get(name)
            .map(|&i| &self.templates[i])
            .ok_or_else(|| DomainError::TemplateNotFound {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Collects templates before freezing them into a [`TemplateCatalog`].
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    templates: Vec<Template>,
}

impl CatalogBuilder {
    /// Register a template. Fails on a name that is already registered.
    pub fn register(mut self, template: Template) -> Result<Self, DomainError> {
        template.validate()?;
        if self.templates.iter().any(|t| t.name() == template.name()) {
            return Err(DomainError::DuplicateTemplate {
                name: template.name().to_string(),
            });
        }
        self.templates.push(template);
        Ok(self)
    }

    /// Register a template, replacing any earlier one with the same name.
    ///
    /// The replacement keeps the original's position in listing order.
    pub fn register_or_replace(mut self, template: Template) -> Result<Self, DomainError> {
        template.validate()?;
        match self
            .templates
            .iter_mut()
            .find(|t| t.name() == template.name())
        {
            Some(existing) => {
                debug!(template = %template.name(), "replacing registered template");
                *existing = template;
            }
            None => self.templates.push(template),
        }
        Ok(self)
    }

    pub fn build(self) -> TemplateCatalog {
        let index = self
            .templates
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name().to_string(), i))
            .collect();

        TemplateCatalog {
            templates: self.templates,
            index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::template::FileSpec;

    fn template(name: &str, language: &str) -> Template {
        Template::builder()
            .name(name)
            .language(language)
            .file(FileSpec::generated("main.txt", "x"))
            .build()
            .unwrap()
    }

    fn catalog() -> TemplateCatalog {
        TemplateCatalog::builder()
            .register(template("go-gin", "go"))
            .unwrap()
            .register(template("rust-axum", "rust"))
            .unwrap()
            .register(template("default", "go"))
            .unwrap()
            .build()
    }

    #[test]
    fn lists_in_registration_order() {
        let names: Vec<_> = catalog()
            .list_templates()
            .iter()
            .map(|t| t.name().to_string())
            .collect();
        assert_eq!(names, ["go-gin", "rust-axum", "default"]);
    }

    #[test]
    fn languages_are_deduplicated_and_sorted() {
        assert_eq!(catalog().list_languages(), ["go", "rust"]);
    }

    #[test]
    fn resolve_finds_template() {
        assert_eq!(catalog().resolve("rust-axum").unwrap().language(), "rust");
    }

    #[test]
    fn resolve_unknown_is_not_found() {
        assert!(matches!(
            catalog().resolve("cobol"),
            Err(DomainError::TemplateNotFound { name }) if name == "cobol"
        ));
    }

    #[test]
    fn duplicate_registration_fails() {
        let err = TemplateCatalog::builder()
            .register(template("a", "go"))
            .unwrap()
            .register(template("a", "rust"))
            .unwrap_err();
        assert!(matches!(err, DomainError::DuplicateTemplate { .. }));
    }

    #[test]
    fn replace_keeps_position() {
        let catalog = TemplateCatalog::builder()
            .register(template("a", "go"))
            .unwrap()
            .register(template("b", "go"))
            .unwrap()
            .register_or_replace(template("a", "rust"))
            .unwrap()
            .build();
        assert_eq!(catalog.list_templates()[0].language(), "rust");
        assert_eq!(catalog.len(), 2);
    }
}
