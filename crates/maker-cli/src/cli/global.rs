//! Presentation flags: how loud the CLI is and where its settings come
//! from. Nothing here changes what gets generated.

use std::path::PathBuf;

use clap::{ArgAction, Args, builder::FalseyValueParser};

#[derive(Debug, Default, Args)]
pub struct GlobalArgs {
    /// Log more: -v run progress, -vv per-file dispatch and requests, -vvv everything
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Print failures only
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Plain output without ANSI styling (also set by NO_COLOR)
    #[arg(long, env = "NO_COLOR", value_parser = FalseyValueParser::new())]
    pub no_color: bool,

    /// Settings file; defaults to the per-user maker config
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}
