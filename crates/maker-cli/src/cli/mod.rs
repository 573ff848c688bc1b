//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text and defaults. No business logic lives here.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Args, Parser};

use maker_adapters::generation::DEFAULT_MODEL;
use maker_core::application::AgentConfig;

pub mod global;
pub use global::GlobalArgs;

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name     = "maker",
    bin_name = "maker",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "\u{26a1} Generate a whole project from a prompt",
    long_about = "Maker plans a project from a template, asks a language model for \
                  every file in parallel and writes the results to disk.",
    after_help = "EXAMPLES:\n\
        \x20 maker --template go-gin --worker-count 2 CRUD API for books\n\
        \x20 maker -language python -template python-fastapi todo list service\n\
        \x20 maker --list-templates",
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(flatten)]
    pub generate: GenerateArgs,

    /// Words of the project description; joined with single spaces.
    #[arg(value_name = "PROMPT", trailing_var_arg = true)]
    pub prompt: Vec<String>,
}

impl Cli {
    /// The prompt words joined into one description, or `None` when blank.
    pub fn prompt(&self) -> Option<String> {
        let prompt = self.prompt.join(" ");
        let prompt = prompt.trim();
        (!prompt.is_empty()).then(|| prompt.to_string())
    }
}

// ── Generation ────────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// API key for the generation provider.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, value_name = "KEY")]
    pub openai_key: Option<String>,

    /// Directory that receives the project directory.
    #[arg(long, value_name = "DIR", default_value = AgentConfig::DEFAULT_OUTPUT_ROOT)]
    pub output_dir: PathBuf,

    /// Module path / package prefix the generated code imports from.
    #[arg(long, value_name = "PKG", default_value = AgentConfig::DEFAULT_BASE_PACKAGE)]
    pub base_package: String,

    /// Concurrent generation workers.
    #[arg(
        long,
        value_name = "N",
        default_value_t = 4,
        value_parser = clap::value_parser!(u8).range(1..=8)
    )]
    pub worker_count: u8,

    /// Template to generate from (see --list-templates).
    #[arg(long, default_value = AgentConfig::DEFAULT_TEMPLATE)]
    pub template: String,

    /// Language the template must target.
    #[arg(long, default_value = AgentConfig::DEFAULT_LANGUAGE)]
    pub language: String,

    /// Model name passed to the provider. Falls back to the config file,
    /// then to the built-in default.
    #[arg(long)]
    pub model: Option<String>,

    /// Per-call timeout in seconds.
    #[arg(long, value_name = "SECONDS", default_value_t = 120)]
    pub timeout: u64,

    /// Name of the generated project directory.
    #[arg(long, value_name = "NAME")]
    pub project_name: Option<String>,

    /// Generation provider: openai, anthropic, gemini, mistral, openrouter,
    /// or any other name for an OpenAI-compatible endpoint.
    #[arg(long, env = "MAKER_PROVIDER")]
    pub provider: Option<String>,

    /// Override the provider's endpoint URL.
    #[arg(long, env = "MAKER_BASE_URL", value_name = "URL")]
    pub base_url: Option<String>,

    /// Extra directory of template manifests.
    #[arg(long, value_name = "DIR")]
    pub templates_dir: Option<PathBuf>,

    /// List available templates and exit.
    #[arg(long, conflicts_with = "list_languages")]
    pub list_templates: bool,

    /// List supported languages and exit.
    #[arg(long)]
    pub list_languages: bool,
}

impl GenerateArgs {
    pub fn model_or<'a>(&'a self, configured: Option<&'a str>) -> &'a str {
        self.model.as_deref().or(configured).unwrap_or(DEFAULT_MODEL)
    }
}

// ── Argument normalisation ────────────────────────────────────────────────────

/// Rewrite single-dash long flags (`-openai-key`) to their double-dash form.
///
/// Short flags (`-v`, `-vv`, `-q`, `-c`) and anything after a bare `--` are
/// left alone. Only the first argument (the binary name) is never touched.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut passthrough = false;
    args.into_iter()
        .map(Into::into)
        .enumerate()
        .map(|(i, arg)| {
            if i == 0 || passthrough {
                return arg;
            }
            let Some(text) = arg.to_str() else {
                return arg;
            };
            if text == "--" {
                passthrough = true;
                return arg;
            }
            match text.strip_prefix('-') {
                Some(rest) if is_single_dash_long(rest) => OsString::from(format!("--{rest}")),
                _ => arg,
            }
        })
        .collect()
}

fn is_single_dash_long(rest: &str) -> bool {
    let name = rest.split('=').next().unwrap_or(rest);
    !rest.starts_with('-')
        && name.len() > 1
        && name.starts_with(|c: char| c.is_ascii_alphabetic())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        && !name.chars().all(|c| matches!(c, 'v' | 'q'))
}
