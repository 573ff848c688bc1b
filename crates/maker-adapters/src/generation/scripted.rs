//! Deterministic generation client for tests and offline runs.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use maker_core::{application::ports::GenerationClient, domain::GenerationError};

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Fail(GenerationError),
    /// Never answers; only a timeout or cancellation ends the call.
    Hang,
}

/// Answers each request according to the file it asks for.
///
/// The file is identified by the ``Generate the file `path`.`` line of the
/// user prompt. Unmatched files get a short placeholder naming the path.
#[derive(Debug, Default)]
pub struct ScriptedClient {
    rules: Vec<(String, Reply)>,
    delay: Duration,
    calls: AtomicUsize,
    active: AtomicUsize,
    peak: AtomicUsize,
    prompts: Mutex<Vec<(String, String)>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, path: &str, content: impl Into<String>) -> Self {
        self.rules.push((path.to_string(), Reply::Text(content.into())));
        self
    }

    pub fn fail(mut self, path: &str, error: GenerationError) -> Self {
        self.rules.push((path.to_string(), Reply::Fail(error)));
        self
    }

    pub fn hang(mut self, path: &str) -> Self {
        self.rules.push((path.to_string(), Reply::Hang));
        self
    }

    /// Sleep this long before every reply.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of calls in flight at once.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Every `(system_prompt, prompt)` received, in arrival order.
    pub fn prompts(&self) -> Vec<(String, String)> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    fn reply_for(&self, prompt: &str) -> Reply {
        self.rules
            .iter()
            .find(|(path, _)| prompt.contains(&format!("`{path}`")))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| Reply::Text(format!("// generated: {}\n", requested_path(prompt))))
    }
}

fn requested_path(prompt: &str) -> &str {
    prompt
        .split_once("Generate the file `")
        .and_then(|(_, rest)| rest.split_once('`'))
        .map(|(path, _)| path)
        .unwrap_or("unknown")
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl GenerationClient for ScriptedClient {
    async fn query(&self, system_prompt: &str, prompt: &str) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push((system_prompt.to_string(), prompt.to_string()));
        }

        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.active);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match self.reply_for(prompt) {
            Reply::Text(text) => Ok(text),
            Reply::Fail(e) => Err(e),
            Reply::Hang => std::future::pending().await,
        }
    }
}
