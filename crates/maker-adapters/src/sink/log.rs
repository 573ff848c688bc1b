//! Event sink that writes progress as `tracing` events.

use std::sync::Arc;

use async_trait::async_trait;
use maker_core::{
    application::ports::{EventSink, SinkError},
    domain::ProgressEvent,
};
use tracing::{info, warn};

/// Logs each event at `info` (failures at `warn`).
///
/// On its own it never fails. Wrapped around another sink it logs first and
/// then delivers, so the log keeps the full run even after that sink's peer
/// has gone away; the inner sink's result is what the agent sees.
#[derive(Clone, Default)]
pub struct LogSink {
    inner: Option<Arc<dyn EventSink>>,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wrapping(inner: Arc<dyn EventSink>) -> Self {
        Self { inner: Some(inner) }
    }

    fn log(event: &ProgressEvent) {
        match event {
            ProgressEvent::Start {
                run_id,
                project,
                template,
                total,
            } => info!(%run_id, project = %project, template = %template, total, "generation started"),
            ProgressEvent::File {
                path,
                completed,
                total,
            } => info!(path = %path, completed, total, "file written"),
            ProgressEvent::Error {
                path,
                error,
                completed,
                total,
                ..
            } => warn!(path = %path, error = %error, completed, total, "file failed"),
            ProgressEvent::Complete { summary, download } => info!(
                run_id = %summary.run_id,
                status = %summary.status,
                written = summary.succeeded(),
                failed = summary.failed.len(),
                download = download.as_deref().unwrap_or("-"),
                "generation finished"
            ),
        }
    }
}

#[async_trait]
impl EventSink for LogSink {
    async fn emit(&self, event: &ProgressEvent) -> Result<(), SinkError> {
        Self::log(event);
        match &self.inner {
            Some(inner) => inner.emit(event).await,
            None => Ok(()),
        }
    }

    async fn flush(&self) -> Result<(), SinkError> {
        match &self.inner {
            Some(inner) => inner.flush().await,
            None => Ok(()),
        }
    }
}
