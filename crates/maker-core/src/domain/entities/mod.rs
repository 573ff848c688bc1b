pub mod catalog;
pub mod common;
pub mod event;
pub mod prompt;
pub mod run;
pub mod task;
pub mod template;

pub use crate::domain::DomainError;
pub use catalog::TemplateCatalog;
pub use run::ProjectRun;
pub use template::Template;
