//! Diagnostics for the `maker` binary.
//!
//! Progress and results are written by [`crate::output`]; `tracing` events
//! go to stderr and stay at WARN unless `-v` is given. `RUST_LOG`, when
//! set, replaces the flag-derived filter entirely.

use std::io::{self, IsTerminal as _};

use anyhow::Context as _;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::GlobalArgs;

const CRATES: [&str; 3] = ["maker", "maker_core", "maker_adapters"];

pub fn init_logging(args: &GlobalArgs) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_for(level(args))));

    let stderr = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(!args.no_color && io::stderr().is_terminal())
        .with_target(args.verbose >= 2)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr)
        .try_init()
        .context("tracing subscriber already installed")
}

/// `-q` wins over any number of `-v`.
fn level(args: &GlobalArgs) -> LevelFilter {
    match (args.quiet, args.verbose) {
        (true, _) => LevelFilter::ERROR,
        (false, 0) => LevelFilter::WARN,
        (false, 1) => LevelFilter::INFO,
        (false, 2) => LevelFilter::DEBUG,
        (false, _) => LevelFilter::TRACE,
    }
}

fn filter_for(level: LevelFilter) -> String {
    let level = level.to_string().to_lowercase();
    CRATES.map(|krate| format!("{krate}={level}")).join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(verbose: u8, quiet: bool) -> GlobalArgs {
        GlobalArgs {
            verbose,
            quiet,
            ..GlobalArgs::default()
        }
    }

    #[test]
    fn verbosity_steps_through_levels() {
        let levels: Vec<_> = (0..5).map(|v| level(&flags(v, false))).collect();
        assert_eq!(
            levels,
            [
                LevelFilter::WARN,
                LevelFilter::INFO,
                LevelFilter::DEBUG,
                LevelFilter::TRACE,
                LevelFilter::TRACE
            ]
        );
    }

    #[test]
    fn quiet_beats_verbose() {
        assert_eq!(level(&flags(3, true)), LevelFilter::ERROR);
    }

    #[test]
    fn filter_names_each_workspace_crate() {
        assert_eq!(
            filter_for(LevelFilter::DEBUG),
            "maker=debug,maker_core=debug,maker_adapters=debug"
        );
    }
}
