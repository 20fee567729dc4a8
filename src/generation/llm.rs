//! The LLM boundary: an [`LlmClient`] trait plus a `reqwest`-backed
//! implementation, so [`super::generate_attacks`] never depends on a
//! concrete HTTP stack (spec.md §4.8 step 5).

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

#[derive(Debug)]
pub enum LlmError {
    Network(String),
    Timeout,
    BlockedContent(String),
    UnexpectedStatus(u16),
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "network error: {msg}"),
            Self::Timeout => write!(f, "request timed out"),
            Self::BlockedContent(reason) => write!(f, "response blocked: {reason}"),
            Self::UnexpectedStatus(code) => write!(f, "unexpected status code {code}"),
        }
    }
}

impl std::error::Error for LlmError {}

/// Anything that can turn a finished prompt into raw model text. Tests
/// supply a canned implementation instead of reaching the network.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn generate_attacks(&self, prompt: &str) -> Result<String, LlmError>;
}

/// OpenAI-compatible chat-completions client, configured from
/// [`crate::config::RuntimeConfig`]'s `llm_model_name`/`llm_api_key`/
/// `llm_base_url`/`llm_call_timeout_secs` fields.
pub struct HttpLlmClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl HttpLlmClient {
    #[must_use]
    pub fn new(base_url: String, api_key: String, model: String, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self { http, base_url, api_key, model }
    }
}

#[derive(serde::Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
}

#[derive(serde::Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn generate_attacks(&self, prompt: &str) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: &self.model,
            messages: [ChatMessage { role: "user", content: prompt }],
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout
                } else {
                    LlmError::Network(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(LlmError::UnexpectedStatus(response.status().as_u16()));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| LlmError::Network("empty choices array".into()))
    }
}
