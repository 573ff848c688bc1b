//! # Maker CLI
//!
//! Generates a whole project from a one-line description.
//!
//! ## Startup sequence
//!
//! 1. Load `.env`, normalise single-dash long flags and parse arguments.
//! 2. Initialise the tracing subscriber (logging).
//! 3. Load configuration (file + env + defaults).
//! 4. Build the [`OutputManager`].
//! 5. List templates/languages, or run one generation.
//! 6. Translate any [`CliError`] into a user-facing message and exit code 1.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{debug, info, instrument, warn};

use maker_adapters::{ClientConfig, HttpGenerationClient, LocalFilesystem, Provider, load_catalog};
use maker_core::{
    application::{Agent, AgentConfig},
    domain::{ProjectName, TemplateCatalog},
};

use crate::{
    cli::{Cli, normalize_args},
    config::AppConfig,
    error::{CliError, CliResult},
    logging::init_logging,
    output::OutputManager,
    progress::ConsoleSink,
};

mod cli;
mod config;
mod error;
mod logging;
mod output;
mod progress;

#[tokio::main]
async fn main() -> ExitCode {
    // Silently ignored if .env doesn't exist.
    let _ = dotenvy::dotenv();

    // ── 1. Parse arguments ────────────────────────────────────────────────
    let cli = match Cli::try_parse_from(normalize_args(std::env::args_os())) {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version come through here too.
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    // ── 2. Initialise tracing ─────────────────────────────────────────────
    if let Err(e) = init_logging(&cli.global) {
        eprintln!("Failed to initialise logging: {e}");
        return ExitCode::FAILURE;
    }

    debug!(
        verbose = cli.global.verbose,
        quiet = cli.global.quiet,
        no_color = cli.global.no_color,
        "CLI started"
    );

    let verbose = cli.global.verbose > 0;

    // ── 3. Load configuration ─────────────────────────────────────────────
    let config = match AppConfig::load(cli.global.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => return handle_error(e, verbose),
    };

    // ── 4. Build output manager ───────────────────────────────────────────
    let output = OutputManager::new(&cli.global, &config);

    // ── 5. Dispatch + 6. Error handling ──────────────────────────────────
    match run(cli, config, output).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => handle_error(e, verbose),
    }
}

#[instrument(skip_all)]
async fn run(cli: Cli, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let args = &cli.generate;
    let templates_dir = args.templates_dir.as_deref().or(config.templates.dir.as_deref());
    let catalog = Arc::new(load_catalog(templates_dir)?);

    if args.list_templates {
        return list_templates(&catalog, &output);
    }
    if args.list_languages {
        return list_languages(&catalog, &output);
    }

    let api_key = args
        .openai_key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or(CliError::MissingApiKey)?;
    let prompt = cli.prompt().ok_or(CliError::MissingPrompt)?;

    let project_name = match &args.project_name {
        Some(name) => name.parse::<ProjectName>()?,
        None => ProjectName::default(),
    };

    let provider: Provider = args
        .provider
        .as_deref()
        .or(config.generation.provider.as_deref())
        .unwrap_or_default()
        .parse()
        .unwrap_or_default();
    let timeout = Duration::from_secs(args.timeout);
    if timeout.is_zero() {
        return Err(CliError::InvalidInput {
            message: "--timeout must be at least 1 second".into(),
        });
    }

    let client = HttpGenerationClient::new(
        ClientConfig::new(api_key)
            .provider(provider)
            .model(args.model_or(config.generation.model.as_deref()))
            .base_url(args.base_url.clone().or(config.generation.base_url.clone()))
            .timeout(timeout),
    );
    info!(
        provider = %client.provider(),
        model = client.model(),
        endpoint = client.endpoint(),
        "generation client ready"
    );

    let agent_config = AgentConfig::default()
        .with_output_root(&args.output_dir)
        .with_project_name(project_name)
        .with_template(&args.template, &args.language)
        .with_base_package(&args.base_package)
        .with_workers(usize::from(args.worker_count))
        .with_timeout(timeout);

    let agent = Agent::new(
        agent_config,
        Arc::new(client),
        catalog,
        Arc::new(LocalFilesystem::new()),
        Arc::new(ConsoleSink::new(output.clone())),
    )?;

    agent.start();

    let handle = agent.cancel_handle();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling run");
            handle.cancel();
        }
    });

    let result = agent.generate_code(&prompt).await;
    interrupt.abort();

    let report = agent.stop().await;
    if let Some(failure) = &report.failure {
        warn!(error = %failure, dropped = report.dropped, "console output was interrupted");
    }

    let summary = result?;
    info!(
        run_id = %summary.run_id,
        files = summary.succeeded(),
        elapsed_ms = summary.elapsed_ms,
        "finished writing project to {}",
        summary.output_dir.display()
    );
    Ok(())
}

fn list_templates(catalog: &TemplateCatalog, output: &OutputManager) -> CliResult<()> {
    output.header("Available templates:")?;
    for template in catalog.list_templates() {
        output.print(&format!(
            "- {}: {} (Language: {})",
            template.name(),
            template.description(),
            template.language()
        ))?;
    }
    Ok(())
}

fn list_languages(catalog: &TemplateCatalog, output: &OutputManager) -> CliResult<()> {
    output.header("Supported languages:")?;
    for language in catalog.list_languages() {
        output.print(&format!("- {language}"))?;
    }
    Ok(())
}

/// Translate a `CliError` into a user message and an exit code.
fn handle_error(err: CliError, verbose: bool) -> ExitCode {
    err.log();

    let msg = if std::io::IsTerminal::is_terminal(&std::io::stderr()) {
        err.format_colored(verbose)
    } else {
        err.format_plain(verbose)
    };
    eprint!("{msg}");

    ExitCode::from(err.exit_code())
}

// ── tests ─────────────────────────────────────────────────────────────────────
