//! Chat-completion providers and startup initialization.
//!
//! Groq is the primary backend. When its client cannot be constructed after a
//! bounded number of attempts, the operator is asked once for an OpenAI key
//! and a single fallback construction is attempted. Running without a working
//! provider is a fatal startup condition.

use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::Config;

pub const GROQ_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const OPENAI_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Debug, Error)]
pub enum InitError {
    #[error("API key is empty")]
    EmptyKey,

    #[error("API key contains bytes that cannot be sent in a header")]
    MalformedKey,

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("no language model provider could be initialized")]
    NoProvider,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request to {provider} failed: {source}")]
    Request {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} returned {status}: {body}")]
    Status {
        provider: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },
}

/// A stateless text-in/text-out completion backend.
#[async_trait]
pub trait ChatProvider: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// OpenAI-compatible chat-completion client; Groq speaks the same protocol.
pub struct ChatCompletionClient {
    name: &'static str,
    endpoint: String,
    api_key: String,
    model: String,
    client: Client,
}

impl ChatCompletionClient {
    pub fn groq(api_key: &str, model: &str, timeout: Duration) -> Result<Self, InitError> {
        Self::new("groq", GROQ_ENDPOINT, api_key, model, timeout)
    }

    pub fn openai(api_key: &str, model: &str, timeout: Duration) -> Result<Self, InitError> {
        Self::new("openai", OPENAI_ENDPOINT, api_key, model, timeout)
    }

    fn new(
        name: &'static str,
        endpoint: &str,
        api_key: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, InitError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(InitError::EmptyKey);
        }
        // Construction is best-effort validation only; it does not probe the
        // remote endpoint.
        HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|_| InitError::MalformedKey)?;

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            name,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            client,
        })
    }

    /// Pulls the reply text out of a chat-completion response. If the
    /// expected shape is absent, the whole payload is coerced to text.
    fn extract_reply(body: &Value) -> String {
        body.pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string())
    }
}

// The API key stays out of debug output.
impl fmt::Debug for ChatCompletionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatCompletionClient")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ChatProvider for ChatCompletionClient {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "system",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(CONTENT_TYPE, "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|source| ProviderError::Request {
                provider: self.name,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                provider: self.name,
                status,
                body,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|source| ProviderError::Request {
                provider: self.name,
                source,
            })?;

        Ok(Self::extract_reply(&body))
    }
}

/// Constructs a working provider, retrying the primary before falling back.
///
/// `prompt_for_key` is only invoked after the primary is exhausted; the
/// binaries pass [`prompt_for_openai_key`], tests pass a closure.
pub fn initialize<F>(config: &Config, prompt_for_key: F) -> Result<Arc<dyn ChatProvider>, InitError>
where
    F: FnOnce() -> Option<String>,
{
    for attempt in 1..=config.init_retries {
        match ChatCompletionClient::groq(
            &config.groq_api_key,
            &config.groq_model,
            config.provider_timeout,
        ) {
            Ok(client) => {
                info!("Initialized Groq provider with model {}", config.groq_model);
                return Ok(Arc::new(client));
            }
            Err(e) => {
                warn!(
                    "Groq initialization attempt {}/{} failed: {}",
                    attempt, config.init_retries, e
                );
            }
        }
    }
    error!(
        "Failed to initialize Groq after {} attempts, falling back to OpenAI",
        config.init_retries
    );

    let key = match prompt_for_key() {
        Some(key) if !key.trim().is_empty() => key,
        _ => return Err(InitError::NoProvider),
    };

    match ChatCompletionClient::openai(&key, &config.openai_model, config.provider_timeout) {
        Ok(client) => {
            info!(
                "Initialized OpenAI fallback provider with model {}",
                config.openai_model
            );
            Ok(Arc::new(client))
        }
        Err(e) => {
            error!("Failed to initialize OpenAI fallback: {}", e);
            Err(InitError::NoProvider)
        }
    }
}

/// Blocking operator prompt for the fallback credential.
pub fn prompt_for_openai_key() -> Option<String> {
    print!("Enter OpenAI API key for fallback: ");
    io::stdout().flush().ok()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).ok()?;
    let key = line.trim().to_string();
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}
