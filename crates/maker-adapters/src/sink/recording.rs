//! Event sink that keeps every event in memory.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use maker_core::{
    application::ports::{EventSink, SinkError},
    domain::ProgressEvent,
};

/// Records events for later inspection. Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    inner: Arc<Mutex<Recorded>>,
    /// Fail with `Closed` once this many events were accepted.
    close_after: Option<usize>,
}

#[derive(Debug, Default)]
struct Recorded {
    events: Vec<ProgressEvent>,
    flushes: usize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Behave like a consumer that goes away after `n` events.
    pub fn closing_after(n: usize) -> Self {
        Self {
            close_after: Some(n),
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.lock().events.clone()
    }

    /// Event type names in delivery order.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.lock().events.iter().map(ProgressEvent::kind).collect()
    }

    pub fn last(&self) -> Option<ProgressEvent> {
        self.lock().events.last().cloned()
    }

    pub fn flushes(&self) -> usize {
        self.lock().flushes
    }

    fn lock(&self) -> MutexGuard<'_, Recorded> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn emit(&self, event: &ProgressEvent) -> Result<(), SinkError> {
        let mut recorded = self.lock();
        if self.close_after.is_some_and(|n| recorded.events.len() >= n) {
            return Err(SinkError::Closed);
        }
        recorded.events.push(event.clone());
        Ok(())
    }

    async fn flush(&self) -> Result<(), SinkError> {
        self.lock().flushes += 1;
        Ok(())
    }
}
