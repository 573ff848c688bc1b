//! Built-in templates and catalog assembly.
//!
//! [`load_catalog`] is the single entry point used by both binaries. It
//! registers the templates that ship with Maker, then layers template
//! manifests from disk on top of them.
//!
//! # Template resolution order
//!
//! 1. Built-ins, in the order listed in [`builtin_templates`].
//! 2. **`$MAKER_TEMPLATES_DIR`**, when set.
//! 3. The directory passed by the caller (CLI config file or flag).
//!
//! A manifest whose name matches an already-registered template replaces it
//! in place, so later sources win without reordering the listing.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use maker_core::domain::{DomainError, FileSpec, Template, TemplateCatalog};

use crate::template_loader::FilesystemTemplateLoader;

/// Environment variable naming an extra templates directory.
pub const TEMPLATES_DIR_ENV: &str = "MAKER_TEMPLATES_DIR";

// ── Public API ────────────────────────────────────────────────────────────────

/// Build the catalog from built-ins plus any template directories found.
///
/// # Errors
///
/// Fails if a templates directory exists but cannot be read. Individual
/// manifests that fail to parse are skipped with a warning by the loader.
#[instrument(skip_all, fields(extra = ?extra_dir))]
pub fn load_catalog(extra_dir: Option<&Path>) -> Result<TemplateCatalog, DomainError> {
    let mut builder = TemplateCatalog::builder();
    for template in builtin_templates()? {
        builder = builder.register(template)?;
    }

    for dir in candidate_paths(extra_dir) {
        if !dir.exists() {
            debug!(path = %dir.display(), "templates directory does not exist, skipping");
            continue;
        }

        let loaded = FilesystemTemplateLoader::new(&dir).load_all()?;
        info!(path = %dir.display(), count = loaded.len(), "loaded template manifests");
        for template in loaded {
            builder = builder.register_or_replace(template)?;
        }
    }

    Ok(builder.build())
}

fn candidate_paths(extra_dir: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = Vec::with_capacity(2);
    if let Some(env_dir) = std::env::var_os(TEMPLATES_DIR_ENV) {
        paths.push(PathBuf::from(env_dir));
    }
    if let Some(dir) = extra_dir {
        paths.push(dir.to_path_buf());
    }
    paths
}

/// The templates that ship with Maker.
pub fn builtin_templates() -> Result<Vec<Template>, DomainError> {
    Ok(vec![
        default_go()?,
        go_gin()?,
        python_fastapi()?,
        node_express()?,
        rust_axum()?,
    ])
}

// ── Go ────────────────────────────────────────────────────────────────────────

const GO_CONVENTIONS: &str = "\
Use Go modules and the standard project layout. Format code as gofmt would. \
Return errors instead of panicking and wrap them with fmt.Errorf and %w. \
Import packages by their full module path under the base package.";

const GO_GITIGNORE: &str = "\
# Binaries
/bin/
*.exe
*.test
*.out

# Editor
.idea/
.vscode/
";

/// Plain Go application; the fallback template.
pub fn default_go() -> Result<Template, DomainError> {
    Template::builder()
        .name("default")
        .description("Go application")
        .language("go")
        .conventions(GO_CONVENTIONS)
        .file(FileSpec::generated(
            "go.mod",
            "Module file declaring the base package as the module path and the Go version. \
             List only dependencies the other files import.",
        ))
        .file(FileSpec::generated(
            "main.go",
            "Program entry point implementing the described application.",
        ))
        .file(FileSpec::generated(
            "README.md",
            "Project overview, how to build and run it, and an example invocation.",
        ))
        .file(FileSpec::fixed(".gitignore", GO_GITIGNORE))
        .build()
}

/// REST API on the Gin framework.
pub fn go_gin() -> Result<Template, DomainError> {
    Template::builder()
        .name("go-gin")
        .description("Go REST API using the Gin framework")
        .language("go")
        .conventions(format!(
            "{GO_CONVENTIONS} Use github.com/gin-gonic/gin for routing. Keep handlers thin \
             and put data types in the models package."
        ))
        .file(FileSpec::generated(
            "go.mod",
            "Module file with the base package as module path, requiring github.com/gin-gonic/gin.",
        ))
        .file(FileSpec::generated(
            "main.go",
            "Create the Gin engine, register the routes from the handlers package and listen on :8080.",
        ))
        .file(FileSpec::generated(
            "internal/handlers/handlers.go",
            "HTTP handlers for every resource in the description, with JSON binding and \
             proper status codes. Keep an in-memory store guarded by a mutex.",
        ))
        .file(FileSpec::generated(
            "internal/models/models.go",
            "Structs for the resources in the description with json and binding tags.",
        ))
        .file(FileSpec::generated(
            "README.md",
            "Overview, run instructions and a curl example for each endpoint.",
        ))
        .build()
}

// ── Python ────────────────────────────────────────────────────────────────────

pub fn python_fastapi() -> Result<Template, DomainError> {
    Template::builder()
        .name("python-fastapi")
        .description("Python REST API using FastAPI")
        .language("python")
        .conventions(
            "Target Python 3.11+. Use type hints everywhere and pydantic models for request \
             and response bodies. Follow PEP 8.",
        )
        .file(FileSpec::generated(
            "requirements.txt",
            "Pinned dependencies: fastapi, uvicorn and anything else the code imports.",
        ))
        .file(FileSpec::generated(
            "app/main.py",
            "FastAPI application with routes for every resource in the description.",
        ))
        .file(FileSpec::generated(
            "app/models.py",
            "Pydantic models for the resources in the description.",
        ))
        .file(FileSpec::fixed("app/__init__.py", ""))
        .file(FileSpec::generated(
            "README.md",
            "Overview, setup with a virtualenv and how to start uvicorn.",
        ))
        .build()
}

// ── JavaScript ────────────────────────────────────────────────────────────────

pub fn node_express() -> Result<Template, DomainError> {
    Template::builder()
        .name("node-express")
        .description("Node.js REST API using Express")
        .language("javascript")
        .conventions(
            "Use CommonJS modules, async/await and express.Router. Validate request bodies \
             and respond with JSON errors.",
        )
        .file(FileSpec::generated(
            "package.json",
            "Package manifest named after the project with express as a dependency and a start script.",
        ))
        .file(FileSpec::generated(
            "src/index.js",
            "Create the Express app, mount the router and listen on PORT or 3000.",
        ))
        .file(FileSpec::generated(
            "src/routes.js",
            "Express router implementing the endpoints for the described resources.",
        ))
        .file(FileSpec::generated(
            "README.md",
            "Overview, install and run instructions.",
        ))
        .file(FileSpec::fixed(".gitignore", "node_modules/\n.env\n"))
        .build()
}

// ── Rust ──────────────────────────────────────────────────────────────────────

pub fn rust_axum() -> Result<Template, DomainError> {
    Template::builder()
        .name("rust-axum")
        .description("Rust REST API using axum and tokio")
        .language("rust")
        .conventions(
            "Edition 2021. Use axum with tokio, serde for JSON and thiserror for errors. \
             No unwrap outside tests.",
        )
        .file(FileSpec::generated(
            "Cargo.toml",
            "Package manifest named after the project with axum, tokio, serde and thiserror.",
        ))
        .file(FileSpec::generated(
            "src/main.rs",
            "Build the router from the routes module and serve it on 0.0.0.0:8080.",
        ))
        .file(FileSpec::generated(
            "src/routes.rs",
            "Handlers and shared state for the described resources.",
        ))
        .file(FileSpec::generated(
            "README.md",
            "Overview, cargo run instructions and example requests.",
        ))
        .file(FileSpec::fixed(".gitignore", "/target\n"))
        .build()
}
