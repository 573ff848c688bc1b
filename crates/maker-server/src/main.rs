//! `maker-server` binary: flags, logging, then [`maker_server::run_server`].

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use maker_adapters::{ClientConfig, Provider, generation::DEFAULT_MODEL, load_catalog};
use maker_core::{application::AgentConfig, domain::WorkerCount};
use maker_server::{AppState, run_server, state::DEFAULT_STATIC_DIR};

#[derive(Debug, Parser)]
#[command(name = "maker-server", version, about = "Serve Maker over HTTP and WebSocket")]
struct Args {
    /// API key for the generation provider.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_key: Option<String>,

    /// Base directory for generated projects.
    #[arg(long, default_value = AgentConfig::DEFAULT_OUTPUT_ROOT)]
    output_dir: PathBuf,

    #[arg(long, default_value_t = 3000)]
    port: u16,

    /// Directory served at `/`.
    #[arg(long, default_value = DEFAULT_STATIC_DIR)]
    static_dir: PathBuf,

    #[arg(long, env = "MAKER_PROVIDER", default_value = "openai")]
    provider: String,

    #[arg(long, env = "MAKER_BASE_URL")]
    base_url: Option<String>,

    /// Model used when a request does not name one.
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Upper bound on the worker count a request may ask for.
    #[arg(long, default_value_t = WorkerCount::DEFAULT_MAX)]
    max_workers: usize,

    /// Per-call timeout in seconds.
    #[arg(long, default_value_t = 120)]
    timeout: u64,

    /// Extra directory of template manifests.
    #[arg(long)]
    templates_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "maker_server=info,maker_core=info,maker_adapters=info,tower_http=info".into()
    });
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(std::io::IsTerminal::is_terminal(&std::io::stderr()))
                .with_writer(std::io::stderr),
        )
        .try_init();

    match serve(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("server stopped: {e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn serve(args: Args) -> anyhow::Result<()> {
    let api_key = args
        .openai_key
        .filter(|k| !k.trim().is_empty())
        .context(
            "Please provide an API key using --openai-key or set the OPENAI_API_KEY environment variable",
        )?;

    let timeout = Duration::from_secs(args.timeout.max(1));
    let catalog = load_catalog(args.templates_dir.as_deref()).context("loading templates")?;
    let provider: Provider = args.provider.parse().unwrap_or_default();

    let client = ClientConfig::new(api_key)
        .provider(provider)
        .model(args.model)
        .base_url(args.base_url)
        .timeout(timeout);
    tracing::info!(provider = %provider, endpoint = %client.endpoint(), "generation client configured");

    let state = AppState::with_http(catalog, client, args.output_dir)
        .with_static_dir(args.static_dir)
        .with_limits(args.max_workers, timeout);

    run_server(state, args.port).await
}
