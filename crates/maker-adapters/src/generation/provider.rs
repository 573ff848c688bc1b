//! Provider wire formats.
//!
//! Each provider differs in endpoint, authentication, request envelope and
//! where the generated text sits in the response. Everything here is pure so
//! it can be tested without a network.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use maker_core::domain::{FailureKind, GenerationError};
use serde::Deserialize;
use serde_json::{Value, json};

/// System instruction used by OpenAI-style providers when none is given.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// `max_tokens` sent to Anthropic, which requires one.
pub const ANTHROPIC_MAX_TOKENS: u32 = 4000;
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

pub const OPENROUTER_REFERER: &str = "https://maker.ai";
pub const OPENROUTER_TITLE: &str = "Maker AI";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Provider {
    #[default]
    OpenAi,
    Anthropic,
    Gemini,
    Mistral,
    OpenRouter,
    /// Any other name: an OpenAI-compatible endpoint.
    Compatible,
}

impl Provider {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Gemini => "gemini",
            Self::Mistral => "mistral",
            Self::OpenRouter => "openrouter",
            Self::Compatible => "compatible",
        }
    }

    /// Endpoint used when no base URL is configured.
    pub fn default_endpoint(self, model: &str) -> String {
        match self {
            Self::OpenAi | Self::Compatible => "https://api.openai.com/v1/chat/completions".into(),
            Self::Anthropic => "https://api.anthropic.com/v1/messages".into(),
            Self::Gemini => format!(
                "https://generativelanguage.googleapis.com/v1/models/{model}:generateContent"
            ),
            Self::Mistral => "https://api.mistral.ai/v1/chat/completions".into(),
            Self::OpenRouter => "https://openrouter.ai/api/v1/chat/completions".into(),
        }
    }

    /// JSON request body for one call.
    pub fn request_body(self, model: &str, system_prompt: &str, prompt: &str) -> Value {
        match self {
            Self::OpenAi | Self::Compatible => {
                let system = if system_prompt.is_empty() {
                    DEFAULT_SYSTEM_PROMPT
                } else {
                    system_prompt
                };
                json!({
                    "model": model,
                    "messages": [
                        { "role": "system", "content": system },
                        { "role": "user", "content": prompt },
                    ],
                })
            }
            Self::Mistral | Self::OpenRouter => {
                let mut messages = Vec::with_capacity(2);
                if !system_prompt.is_empty() {
                    messages.push(json!({ "role": "system", "content": system_prompt }));
                }
                messages.push(json!({ "role": "user", "content": prompt }));
                json!({ "model": model, "messages": messages })
            }
            Self::Anthropic => {
                let mut body = json!({
                    "model": model,
                    "messages": [{ "role": "user", "content": prompt }],
                    "max_tokens": ANTHROPIC_MAX_TOKENS,
                });
                if !system_prompt.is_empty() {
                    body["system"] = Value::String(system_prompt.to_string());
                }
                body
            }
            Self::Gemini => {
                let text = if system_prompt.is_empty() {
                    prompt.to_string()
                } else {
                    format!("{system_prompt}\n\n{prompt}")
                };
                json!({ "contents": [{ "parts": [{ "text": text }] }] })
            }
        }
    }

    /// Turn an HTTP status and body into generated text or a classified
    /// error.
    pub fn interpret(self, status: u16, body: &str) -> Result<String, GenerationError> {
        let status_kind = classify_status(status);

        let parsed: ApiResponse = match serde_json::from_str(body) {
            Ok(parsed) => parsed,
            Err(e) => {
                return Err(match status_kind {
                    Some(kind) => GenerationError {
                        kind,
                        message: format!("HTTP {status}: {}", snippet(body)),
                    },
                    None => GenerationError::fatal(format!("error decoding response: {e}")),
                });
            }
        };

        if let Some(message) = parsed.error.as_ref().and_then(ApiErrorBody::message) {
            let kind = status_kind.unwrap_or(FailureKind::Fatal);
            return Err(GenerationError {
                kind,
                message: format!("API error: {message}"),
            });
        }

        if let Some(kind) = status_kind {
            return Err(GenerationError {
                kind,
                message: format!("HTTP {status}"),
            });
        }

        let text = match self {
            Self::OpenAi | Self::Compatible | Self::Mistral | Self::OpenRouter => parsed
                .choices
                .into_iter()
                .next()
                .map(|c| c.message.content),
            Self::Anthropic => parsed.content.into_iter().next().map(|b| b.text),
            Self::Gemini => parsed
                .candidates
                .into_iter()
                .next()
                .and_then(|c| c.content.parts.into_iter().next())
                .map(|p| p.text),
        };

        text.ok_or_else(|| match self {
            Self::Anthropic | Self::Gemini => GenerationError::transient("no content returned from API"),
            _ => GenerationError::transient("no choices returned from API"),
        })
    }
}

impl FromStr for Provider {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "" | "openai" => Self::OpenAi,
            "anthropic" => Self::Anthropic,
            "gemini" => Self::Gemini,
            "mistral" => Self::Mistral,
            "openrouter" => Self::OpenRouter,
            _ => Self::Compatible,
        })
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `None` for success, otherwise how to treat the failure.
pub fn classify_status(status: u16) -> Option<FailureKind> {
    match status {
        200..=299 => None,
        408 | 429 | 500..=599 => Some(FailureKind::Transient),
        _ => Some(FailureKind::Fatal),
    }
}

fn snippet(body: &str) -> String {
    const MAX: usize = 200;
    let trimmed = body.trim();
    match trimmed.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}…", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

// ── Response shapes ───────────────────────────────────────────────────────────

// One permissive struct covers every provider; absent sections default.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApiResponse {
    choices: Vec<Choice>,
    content: Vec<TextBlock>,
    candidates: Vec<Candidate>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Choice {
    message: ChatMessage,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChatMessage {
    content: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TextBlock {
    text: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CandidateContent {
    parts: Vec<TextBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApiErrorBody {
    Object {
        #[serde(default)]
        message: String,
    },
    Text(String),
}

impl ApiErrorBody {
    fn message(&self) -> Option<&str> {
        let msg = match self {
            Self::Object { message } => message,
            Self::Text(text) => text,
        };
        (!msg.is_empty()).then_some(msg.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_names_map_with_compatible_fallback() {
        assert_eq!("".parse::<Provider>(), Ok(Provider::OpenAi));
        assert_eq!("OpenAI".parse::<Provider>(), Ok(Provider::OpenAi));
        assert_eq!("anthropic".parse::<Provider>(), Ok(Provider::Anthropic));
        assert_eq!("openrouter".parse::<Provider>(), Ok(Provider::OpenRouter));
        assert_eq!("groq".parse::<Provider>(), Ok(Provider::Compatible));
    }

    #[test]
    fn openai_body_defaults_system_prompt() {
        let body = Provider::OpenAi.request_body("gpt-4o-mini", "", "hi");
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], DEFAULT_SYSTEM_PROMPT);
        assert_eq!(body["messages"][1]["content"], "hi");
    }

    #[test]
    fn mistral_omits_empty_system_message() {
        let body = Provider::Mistral.request_body("m", "", "hi");
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["role"], "user");
    }

    #[test]
    fn anthropic_puts_system_at_top_level() {
        let body = Provider::Anthropic.request_body("claude", "be terse", "hi");
        assert_eq!(body["system"], "be terse");
        assert_eq!(body["max_tokens"], 4000);
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn gemini_joins_system_and_prompt() {
        let body = Provider::Gemini.request_body("gemini-pro", "sys", "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "sys\n\nuser");
        assert!(Provider::Gemini.default_endpoint("gemini-pro").contains("gemini-pro:generateContent"));
    }

    #[test]
    fn extracts_text_per_provider() {
        let openai = r#"{"choices":[{"message":{"content":"package main"}}]}"#;
        assert_eq!(Provider::OpenAi.interpret(200, openai).unwrap(), "package main");

        let anthropic = r#"{"content":[{"type":"text","text":"fn main() {}"}]}"#;
        assert_eq!(Provider::Anthropic.interpret(200, anthropic).unwrap(), "fn main() {}");

        let gemini = r#"{"candidates":[{"content":{"parts":[{"text":"print()"}]}}]}"#;
        assert_eq!(Provider::Gemini.interpret(200, gemini).unwrap(), "print()");
    }

    #[test]
    fn status_classification() {
        assert_eq!(classify_status(200), None);
        assert_eq!(classify_status(429), Some(FailureKind::Transient));
        assert_eq!(classify_status(503), Some(FailureKind::Transient));
        assert_eq!(classify_status(401), Some(FailureKind::Fatal));
        assert_eq!(classify_status(400), Some(FailureKind::Fatal));
    }

    #[test]
    fn api_error_message_is_fatal_unless_status_is_transient() {
        let body = r#"{"error":{"message":"Incorrect API key provided"}}"#;
        let err = Provider::OpenAi.interpret(401, body).unwrap_err();
        assert_eq!(err.kind, FailureKind::Fatal);
        assert!(err.message.contains("Incorrect API key"));

        let err = Provider::OpenAi.interpret(200, body).unwrap_err();
        assert_eq!(err.kind, FailureKind::Fatal);

        let limited = r#"{"error":{"message":"Rate limit reached"}}"#;
        let err = Provider::OpenAi.interpret(429, limited).unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn empty_choices_are_transient() {
        let err = Provider::OpenAi.interpret(200, r#"{"choices":[]}"#).unwrap_err();
        assert!(err.is_transient());
        assert_eq!(err.message, "no choices returned from API");
    }

    #[test]
    fn undecodable_success_body_is_fatal_but_gateway_html_is_transient() {
        let err = Provider::OpenAi.interpret(200, "not json").unwrap_err();
        assert_eq!(err.kind, FailureKind::Fatal);

        let err = Provider::OpenAi
            .interpret(502, "<html>Bad Gateway</html>")
            .unwrap_err();
        assert!(err.is_transient());
        assert!(err.message.starts_with("HTTP 502"));
    }
}
