//! HTTP generation client for hosted chat-completion APIs.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use maker_core::{application::ports::GenerationClient, domain::GenerationError};
use tracing::{debug, instrument};

use super::provider::{ANTHROPIC_VERSION, OPENROUTER_REFERER, OPENROUTER_TITLE, Provider};

/// Default model when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Connection settings for [`HttpGenerationClient`].
#[derive(Clone)]
pub struct ClientConfig {
    pub provider: Provider,
    pub api_key: String,
    pub model: String,
    /// Replaces the provider's default endpoint when set.
    pub base_url: Option<String>,
    /// Transport-level timeout. The worker pool enforces its own per-call
    /// limit on top of this.
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            provider: Provider::default(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: None,
            timeout: Duration::from_secs(120),
        }
    }

    pub fn provider(mut self, provider: Provider) -> Self {
        self.provider = provider;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn base_url(mut self, base_url: Option<String>) -> Self {
        self.base_url = base_url.filter(|u| !u.trim().is_empty());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The URL requests are sent to.
    pub fn endpoint(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| self.provider.default_endpoint(&self.model))
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// [`GenerationClient`] that talks to a provider over HTTPS.
///
/// One instance is shared by every worker of a run; `reqwest::Client` pools
/// connections internally.
#[derive(Debug, Clone)]
pub struct HttpGenerationClient {
    config: ClientConfig,
    endpoint: String,
    client: reqwest::Client,
}

impl HttpGenerationClient {
    pub fn new(config: ClientConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_default();

        Self {
            endpoint: config.endpoint(),
            config,
            client,
        }
    }

    pub fn provider(&self) -> Provider {
        self.config.provider
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request(&self, system_prompt: &str, prompt: &str) -> reqwest::RequestBuilder {
        let body = self
            .config
            .provider
            .request_body(&self.config.model, system_prompt, prompt);
        let key = &self.config.api_key;

        let builder = self.client.post(&self.endpoint).json(&body);
        match self.config.provider {
            Provider::OpenAi | Provider::Compatible | Provider::Mistral => builder.bearer_auth(key),
            Provider::OpenRouter => builder
                .bearer_auth(key)
                .header("HTTP-Referer", OPENROUTER_REFERER)
                .header("X-Title", OPENROUTER_TITLE),
            Provider::Anthropic => builder
                .header("x-api-key", key)
                .header("anthropic-version", ANTHROPIC_VERSION),
            Provider::Gemini => builder.query(&[("key", key)]),
        }
    }
}

#[async_trait]
impl GenerationClient for HttpGenerationClient {
    #[instrument(
        skip_all,
        fields(provider = %self.config.provider, model = %self.config.model)
    )]
    async fn query(&self, system_prompt: &str, prompt: &str) -> Result<String, GenerationError> {
        let response = self
            .request(system_prompt, prompt)
            .send()
            .await
            .map_err(send_failure)?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| GenerationError::transient(format!("error reading response: {e}")))?;

        debug!(status, bytes = body.len(), "provider responded");
        self.config.provider.interpret(status, &body)
    }
}

/// A request reqwest could not even build (bad endpoint URL, bad header)
/// fails the same way on every attempt.
fn send_failure(e: reqwest::Error) -> GenerationError {
    if e.is_builder() {
        GenerationError::fatal(format!("invalid request: {e}"))
    } else {
        GenerationError::transient(format!("error sending request: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_overrides_default_endpoint() {
        let config = ClientConfig::new("k")
            .provider(Provider::Mistral)
            .base_url(Some("http://localhost:8080/v1/chat/completions".into()));
        assert_eq!(config.endpoint(), "http://localhost:8080/v1/chat/completions");

        let blank = ClientConfig::new("k").base_url(Some("  ".into()));
        assert_eq!(blank.endpoint(), "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn debug_output_hides_the_key() {
        let config = ClientConfig::new("sk-secret");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn request_headers_follow_provider() {
        let anthropic = HttpGenerationClient::new(ClientConfig::new("k").provider(Provider::Anthropic));
        let req = anthropic.request("s", "p").build().unwrap();
        assert_eq!(req.headers()["x-api-key"], "k");
        assert_eq!(req.headers()["anthropic-version"], ANTHROPIC_VERSION);

        let gemini = HttpGenerationClient::new(
            ClientConfig::new("g-key").provider(Provider::Gemini).model("gemini-pro"),
        );
        let req = gemini.request("s", "p").build().unwrap();
        assert_eq!(req.url().query(), Some("key=g-key"));
        assert!(req.headers().get("authorization").is_none());

        let router = HttpGenerationClient::new(ClientConfig::new("r").provider(Provider::OpenRouter));
        let req = router.request("s", "p").build().unwrap();
        assert_eq!(req.headers()["authorization"], "Bearer r");
        assert_eq!(req.headers()["x-title"], OPENROUTER_TITLE);
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_transient() {
        let client = HttpGenerationClient::new(
            ClientConfig::new("k")
                .base_url(Some("http://127.0.0.1:9/v1/chat/completions".into()))
                .timeout(Duration::from_secs(2)),
        );
        let err = client.query("s", "p").await.unwrap_err();
        assert!(err.is_transient(), "{err}");
    }

    #[tokio::test]
    async fn malformed_endpoint_is_fatal() {
        let client = HttpGenerationClient::new(
            ClientConfig::new("k").base_url(Some("not a url".into())),
        );
        let err = client.query("s", "p").await.unwrap_err();
        assert!(!err.is_transient(), "{err}");
        assert!(err.to_string().contains("invalid request"), "{err}");
    }
}
