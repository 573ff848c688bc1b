//! Generation backends.

mod http;
mod provider;
mod scripted;

pub use http::{ClientConfig, DEFAULT_MODEL, HttpGenerationClient};
pub use provider::{Provider, classify_status};
pub use scripted::ScriptedClient;
