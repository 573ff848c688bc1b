//! Filesystem-based template loader.
//!
//! Discovers and parses TOML template manifests from a directory,
//! converting them into domain [`Template`] objects ready for the catalog.
//!
//! # Directory layout expected
//!
//! ```text
//! templates/
//! ├── go-chi.toml              ← standalone manifest
//! └── python-flask/
//!     ├── template.toml        ← manifest (required in a directory)
//!     ├── .gitignore           ← copied verbatim (static file)
//!     └── docs/
//!         └── CONTRIBUTING.md  ← copied verbatim (static file)
//! ```
//!
//! # Manifest format
//!
//! ```toml
//! [template]
//! name        = "go-chi"
//! description = "Go REST API using chi"   # optional
//! language    = "go"
//! conventions = "Use chi for routing."    # optional
//!
//! # Generated file: the backend writes it from the instruction.
//! [[files]]
//! path        = "main.go"
//! instruction = "Create the router and listen on :8080."
//!
//! # Static file: written exactly as given.
//! [[files]]
//! path    = "LICENSE"
//! content = "MIT License"
//! ```
//!
//! Every `[[files]]` entry needs exactly one of `instruction` or `content`.
//! In directory templates, files found on disk that the manifest does not
//! list are appended as static files after the manifest entries.

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

use maker_core::domain::{DomainError, FileSpec, RelativePath, Template};

/// Manifest file name inside a template directory.
pub const MANIFEST_FILE: &str = "template.toml";

// ── Manifest types ────────────────────────────────────────────────────────────

/// Deserialised representation of a template manifest.
#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct TemplateManifest {
    pub template: TemplateSection,
    #[serde(default)]
    pub files: Vec<FileEntry>,
}

/// `[template]` section.
#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct TemplateSection {
    pub name: String,
    pub description: Option<String>,
    pub language: String,
    pub conventions: Option<String>,
}

/// One `[[files]]` entry.
#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileEntry {
    pub path: String,
    pub instruction: Option<String>,
    pub content: Option<String>,
}

impl FileEntry {
    fn into_spec(self, template: &str) -> Result<FileSpec, DomainError> {
        let path = RelativePath::try_new(normalize_path(&self.path))?;
        match (self.instruction, self.content) {
            (Some(instruction), None) => Ok(FileSpec::generated(path, instruction)),
            (None, Some(content)) => Ok(FileSpec::fixed(path, content)),
            (Some(_), Some(_)) => Err(DomainError::InvalidTemplate(format!(
                "{template}: file '{}' has both instruction and content",
                self.path
            ))),
            (None, None) => Err(DomainError::InvalidTemplate(format!(
                "{template}: file '{}' needs an instruction or content",
                self.path
            ))),
        }
    }
}

/// Parse a manifest from TOML text.
pub fn parse_manifest(raw: &str) -> Result<TemplateManifest, DomainError> {
    toml::from_str(raw).map_err(|e| DomainError::InvalidTemplate(format!("invalid manifest: {e}")))
}

// ── Loader ────────────────────────────────────────────────────────────────────

/// Loads [`Template`] objects from a directory of manifests.
///
/// Each `*.toml` file directly inside `templates_dir`, and each immediate
/// subdirectory containing a `template.toml`, is one template. Entries that
/// fail to load emit a `WARN` log and are skipped; they do not prevent
/// other templates from loading.
///
/// # Example
///
/// ```no_run
/// use maker_adapters::template_loader::FilesystemTemplateLoader;
///
/// let loader = FilesystemTemplateLoader::new("./templates");
/// let templates = loader.load_all()?;
/// println!("Loaded {} templates", templates.len());
/// # Ok::<(), maker_core::domain::DomainError>(())
/// ```
pub struct FilesystemTemplateLoader {
    templates_dir: PathBuf,
}

impl FilesystemTemplateLoader {
    pub fn new(templates_dir: impl Into<PathBuf>) -> Self {
        Self {
            templates_dir: templates_dir.into(),
        }
    }

    /// Load every valid template under `templates_dir`, sorted by file name
    /// so the listing order is stable.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidTemplate`] if `templates_dir` is missing
    /// or unreadable.
    #[instrument(skip(self), fields(dir = %self.templates_dir.display()))]
    pub fn load_all(&self) -> Result<Vec<Template>, DomainError> {
        if !self.templates_dir.is_dir() {
            return Err(DomainError::InvalidTemplate(format!(
                "templates directory not found: {}",
                self.templates_dir.display()
            )));
        }

        let mut entries = fs::read_dir(&self.templates_dir)
            .map_err(|e| {
                DomainError::InvalidTemplate(format!(
                    "failed to read templates directory '{}': {e}",
                    self.templates_dir.display()
                ))
            })?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DomainError::InvalidTemplate(format!("failed to read directory entry: {e}")))?;
        entries.sort();

        let mut templates = Vec::new();
        for path in entries {
            let loaded = if path.is_dir() {
                if !path.join(MANIFEST_FILE).exists() {
                    debug!(dir = %path.display(), "no manifest, skipping");
                    continue;
                }
                self.load_template_dir(&path)
            } else if path.extension().is_some_and(|ext| ext == "toml") {
                self.load_manifest_file(&path)
            } else {
                continue;
            };

            match loaded {
                Ok(template) => {
                    debug!(name = %template.name(), files = template.file_count(), "loaded template");
                    templates.push(template);
                }
                Err(e) => {
                    warn!(
                        path  = %path.display(),
                        error = %e,
                        "skipping template due to load error"
                    );
                }
            }
        }

        debug!(count = templates.len(), "finished loading templates");
        Ok(templates)
    }

    fn load_manifest_file(&self, path: &Path) -> Result<Template, DomainError> {
        let manifest = read_manifest(path)?;
        build_template(manifest, Vec::new())
    }

    /// Manifest entries first, then unlisted files on disk as static files.
    #[instrument(skip(self), fields(dir = %dir.display()))]
    fn load_template_dir(&self, dir: &Path) -> Result<Template, DomainError> {
        let manifest = read_manifest(&dir.join(MANIFEST_FILE))?;

        let listed: HashSet<String> = manifest
            .files
            .iter()
            .map(|f| normalize_path(&f.path))
            .collect();

        let mut extra = Vec::new();
        for entry in WalkDir::new(dir).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                DomainError::InvalidTemplate(format!("failed to walk '{}': {e}", dir.display()))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry.path().strip_prefix(dir).map_err(|e| {
                DomainError::InvalidTemplate(format!("bad path '{}': {e}", entry.path().display()))
            })?;
            let relative = normalize_path(&relative.to_string_lossy());
            if relative == MANIFEST_FILE || listed.contains(&relative) {
                continue;
            }

            let content = fs::read_to_string(entry.path()).map_err(|e| {
                DomainError::InvalidTemplate(format!(
                    "failed to read '{}': {e}",
                    entry.path().display()
                ))
            })?;
            extra.push(FileSpec::fixed(RelativePath::try_new(relative)?, content));
        }

        build_template(manifest, extra)
    }
}

fn read_manifest(path: &Path) -> Result<TemplateManifest, DomainError> {
    let raw = fs::read_to_string(path).map_err(|e| {
        DomainError::InvalidTemplate(format!("failed to read '{}': {e}", path.display()))
    })?;
    parse_manifest(&raw).map_err(|e| match e {
        DomainError::InvalidTemplate(msg) => {
            DomainError::InvalidTemplate(format!("{}: {msg}", path.display()))
        }
        other => other,
    })
}

fn build_template(manifest: TemplateManifest, extra: Vec<FileSpec>) -> Result<Template, DomainError> {
    let TemplateManifest { template, files } = manifest;
    let specs = files
        .into_iter()
        .map(|entry| entry.into_spec(&template.name))
        .collect::<Result<Vec<_>, _>>()?;

    let mut builder = Template::builder()
        .name(template.name)
        .language(template.language)
        .files(specs)
        .files(extra);
    if let Some(description) = template.description {
        builder = builder.description(description);
    }
    if let Some(conventions) = template.conventions {
        builder = builder.conventions(conventions);
    }
    builder.build()
}

fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use maker_core::domain::FileContent;
    use tempfile::TempDir;

    const CHI_MANIFEST: &str = r#"
[template]
name        = "go-chi"
description = "Go REST API using chi"
language    = "Go"
conventions = "Use chi for routing."

[[files]]
path        = "main.go"
instruction = "Create the router."

[[files]]
path    = "LICENSE"
content = "MIT"
"#;

    fn write(dir: &Path, rel: &str, content: &str) {
        let full = dir.join(rel);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full, content).unwrap();
    }

    // ── load_all ──────────────────────────────────────────────────────────

    #[test]
    fn load_all_returns_error_for_missing_dir() {
        let loader = FilesystemTemplateLoader::new("/absolutely/does/not/exist");
        assert!(matches!(
            loader.load_all(),
            Err(DomainError::InvalidTemplate(_))
        ));
    }

    #[test]
    fn loads_standalone_manifest() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "go-chi.toml", CHI_MANIFEST);
        write(temp.path(), "README.md", "ignored");

        let templates = FilesystemTemplateLoader::new(temp.path()).load_all().unwrap();
        assert_eq!(templates.len(), 1);

        let t = &templates[0];
        assert_eq!(t.name(), "go-chi");
        assert_eq!(t.language(), "go");
        assert_eq!(t.conventions(), Some("Use chi for routing."));
        assert!(matches!(t.files()[0].content, FileContent::Instruction(_)));
        assert_eq!(t.files()[1].content, FileContent::Static("MIT".into()));
    }

    #[test]
    fn directory_template_adds_unlisted_files_as_static() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("go-chi");
        write(&dir, MANIFEST_FILE, CHI_MANIFEST);
        write(&dir, ".gitignore", "bin/\n");
        write(&dir, "docs/CONTRIBUTING.md", "be nice");
        write(&dir, "main.go", "listed in manifest, so not copied");

        let templates = FilesystemTemplateLoader::new(temp.path()).load_all().unwrap();
        let paths: Vec<_> = templates[0].files().iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, ["main.go", "LICENSE", ".gitignore", "docs/CONTRIBUTING.md"]);
    }

    #[test]
    fn invalid_manifests_are_skipped() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a-good.toml", CHI_MANIFEST);
        write(temp.path(), "b-broken.toml", "[template\nname=");
        write(
            temp.path(),
            "c-both.toml",
            r#"
[template]
name = "both"
language = "go"

[[files]]
path = "x.go"
instruction = "i"
content = "c"
"#,
        );
        write(
            temp.path(),
            "d-escape.toml",
            r#"
[template]
name = "escape"
language = "go"

[[files]]
path = "../x.go"
instruction = "i"
"#,
        );
        fs::create_dir(temp.path().join("no-manifest")).unwrap();

        let templates = FilesystemTemplateLoader::new(temp.path()).load_all().unwrap();
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].name(), "go-chi");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = parse_manifest("[template]\nname='x'\nlanguage='go'\nkind='cli'\n").unwrap_err();
        assert!(matches!(err, DomainError::InvalidTemplate(msg) if msg.contains("kind")));
    }

    #[test]
    fn normalize_path_replaces_backslashes() {
        assert_eq!(normalize_path(r"internal\db\db.go"), "internal/db/db.go");
    }
}
