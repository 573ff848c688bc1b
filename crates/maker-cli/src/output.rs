//! User-facing terminal output.
//!
//! Everything the CLI says to the user goes through [`OutputManager`];
//! diagnostics go through `tracing` to stderr instead.

use std::io::{self, IsTerminal};

use console::Term;
use owo_colors::OwoColorize;

use crate::cli::GlobalArgs;
use crate::config::AppConfig;

/// How a line is marked and coloured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Plain,
    Header,
    Success,
    Failure,
    Warning,
    Info,
}

impl Tone {
    fn symbol(self) -> Option<&'static str> {
        match self {
            Self::Plain | Self::Header => None,
            Self::Success => Some("\u{2713}"),
            Self::Failure => Some("\u{2717}"),
            Self::Warning => Some("\u{26a0}"),
            Self::Info => Some("\u{2139}"),
        }
    }

    /// Failures are shown even under `--quiet`.
    fn survives_quiet(self) -> bool {
        self == Self::Failure
    }
}

#[derive(Debug, Clone)]
pub struct OutputManager {
    quiet: bool,
    color: bool,
    term: Term,
}

impl OutputManager {
    /// Colour is on only when nothing disables it and stdout is a terminal.
    pub fn new(args: &GlobalArgs, config: &AppConfig) -> Self {
        Self {
            quiet: args.quiet,
            color: !(args.no_color || config.output.no_color) && io::stdout().is_terminal(),
            term: Term::stdout(),
        }
    }

    /// Render `msg` in `tone` without writing it.
    pub fn styled(&self, tone: Tone, msg: &str) -> String {
        let Some(symbol) = tone.symbol() else {
            return match tone {
                Tone::Header if self.color => msg.cyan().bold().to_string(),
                _ => msg.to_owned(),
            };
        };
        if !self.color {
            return format!("{symbol} {msg}");
        }
        match tone {
            Tone::Success => format!("{} {}", symbol.green().bold(), msg.green()),
            Tone::Failure => format!("{} {}", symbol.red().bold(), msg.red()),
            Tone::Warning => format!("{} {}", symbol.yellow().bold(), msg.yellow()),
            _ => format!("{} {}", symbol.blue().bold(), msg.blue()),
        }
    }

    pub fn write(&self, tone: Tone, msg: &str) -> io::Result<()> {
        if self.quiet && !tone.survives_quiet() {
            return Ok(());
        }
        self.term.write_line(&self.styled(tone, msg))
    }

    pub fn print(&self, msg: &str) -> io::Result<()> {
        self.write(Tone::Plain, msg)
    }

    pub fn header(&self, msg: &str) -> io::Result<()> {
        self.write(Tone::Header, msg)
    }

    pub fn success(&self, msg: &str) -> io::Result<()> {
        self.write(Tone::Success, msg)
    }

    pub fn error(&self, msg: &str) -> io::Result<()> {
        self.write(Tone::Failure, msg)
    }

    pub fn warning(&self, msg: &str) -> io::Result<()> {
        self.write(Tone::Warning, msg)
    }

    pub fn info(&self, msg: &str) -> io::Result<()> {
        self.write(Tone::Info, msg)
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }
}
