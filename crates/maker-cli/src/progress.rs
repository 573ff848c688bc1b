//! Console rendering of run progress.

use std::io::{self, IsTerminal};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use maker_core::application::{EventSink, SinkError};
use maker_core::domain::{ProgressEvent, RunState, RunSummary};

use crate::output::{OutputManager, Tone};

const BAR_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] [{bar:32.cyan/blue}] {pos}/{len} {msg}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BarMode {
    Off,
    Stderr,
    #[cfg(test)]
    Hidden,
}

/// Prints one line per event, with a progress bar on interactive
/// terminals.
pub struct ConsoleSink {
    output: OutputManager,
    mode: BarMode,
    bar: Mutex<Option<ProgressBar>>,
}

impl ConsoleSink {
    pub fn new(output: OutputManager) -> Self {
        let mode = if !output.is_quiet() && io::stderr().is_terminal() {
            BarMode::Stderr
        } else {
            BarMode::Off
        };
        Self::with_mode(output, mode)
    }

    fn with_mode(output: OutputManager, mode: BarMode) -> Self {
        Self {
            output,
            mode,
            bar: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<ProgressBar>> {
        self.bar.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn current_bar(&self) -> Option<ProgressBar> {
        self.lock().clone()
    }

    fn start_bar(&self, total: usize) -> Option<ProgressBar> {
        let target = match self.mode {
            BarMode::Off => return None,
            BarMode::Stderr => ProgressDrawTarget::stderr(),
            #[cfg(test)]
            BarMode::Hidden => ProgressDrawTarget::hidden(),
        };
        let style = ProgressStyle::with_template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        let bar = ProgressBar::with_draw_target(Some(total as u64), target).with_style(style);
        *self.lock() = Some(bar.clone());
        Some(bar)
    }

    /// Per-file lines go above the bar when one is active.
    fn line(&self, tone: Tone, text: &str) -> io::Result<()> {
        match self.current_bar() {
            Some(bar) => {
                bar.println(self.output.styled(tone, text));
                Ok(())
            }
            None => self.output.write(tone, text),
        }
    }

    fn render(&self, event: &ProgressEvent) -> io::Result<()> {
        match event {
            ProgressEvent::Start {
                project,
                template,
                total,
                ..
            } => {
                self.output
                    .header(&format!("\u{25b6} generating {total} files for {project} ({template})"))?;
                self.start_bar(*total);
                Ok(())
            }
            ProgressEvent::File { path, .. } => {
                if let Some(bar) = self.current_bar() {
                    bar.set_message(path.to_string());
                    bar.inc(1);
                }
                self.line(Tone::Success, path.as_str())
            }
            ProgressEvent::Error { path, error, .. } => {
                if let Some(bar) = self.current_bar() {
                    bar.inc(1);
                }
                self.line(Tone::Failure, &format!("{path}: {error}"))
            }
            ProgressEvent::Complete { summary, download } => {
                if let Some(bar) = self.lock().take() {
                    bar.finish_and_clear();
                }
                self.summarize(summary, download.as_deref())
            }
        }
    }

    fn summarize(&self, summary: &RunSummary, download: Option<&str>) -> io::Result<()> {
        let seconds = summary.elapsed_ms as f64 / 1000.0;
        match summary.status {
            RunState::Completed => {
                self.output.success(&format!(
                    "wrote {} files to {} in {seconds:.1}s",
                    summary.succeeded(),
                    summary.output_dir.display()
                ))?;
                if let Some(link) = download {
                    self.output.info(&format!("download: {link}"))?;
                }
                Ok(())
            }
            RunState::Cancelled => self.output.warning(&format!(
                "cancelled after {} of {} files",
                summary.succeeded(),
                summary.total
            )),
            _ => self.output.error(&format!(
                "{} of {} files failed; {} written to {}",
                summary.failed.len(),
                summary.total,
                summary.succeeded(),
                summary.output_dir.display()
            )),
        }
    }
}

#[async_trait]
impl EventSink for ConsoleSink {
    async fn emit(&self, event: &ProgressEvent) -> Result<(), SinkError> {
        self.render(event)
            .map_err(|e| SinkError::Delivery(e.to_string()))
    }
}
