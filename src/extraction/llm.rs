//! LLM client used by extraction passes
//!
//! Two implementations:
//! - `OpenRouterClient`: chat-completions over HTTP with JSON output (production)
//! - `MockClient`: returns preconfigured replies per pass (testing)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Errors from LLM client operations.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("LLM not available: {0}")]
    Unavailable(String),
    #[error("request failed: {0}")]
    RequestFailed(String),
    #[error("response parse error: {0}")]
    ParseError(String),
    #[error("no mock reply for pass '{0}'")]
    NoReply(String),
}

/// One completion request issued by an extraction pass.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Name of the pass issuing the request (e.g. "relations")
    pub pass: String,
    /// Fully rendered prompt
    pub prompt: String,
}

/// Client trait for LLM completions.
///
/// Abstracts over transport so the pipeline doesn't depend on how the model
/// is reached. Replies are expected to be a JSON object serialized as text.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;
}

/// Generation settings for [`OpenRouterClient`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub request_timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            model: "openai/gpt-4o".to_string(),
            temperature: 0.0,
            max_tokens: 10_000,
            request_timeout_secs: 300,
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// OpenRouter chat-completions client
#[derive(Clone)]
pub struct OpenRouterClient {
    api_key: String,
    settings: LlmSettings,
    client: reqwest::Client,
}

impl OpenRouterClient {
    pub fn new(api_key: impl Into<String>, settings: LlmSettings) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|e| LlmError::Unavailable(e.to_string()))?;
        Ok(Self {
            api_key: api_key.into(),
            settings,
            client,
        })
    }

    pub fn settings(&self) -> &LlmSettings {
        &self.settings
    }
}

impl std::fmt::Debug for OpenRouterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenRouterClient")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl LlmClient for OpenRouterClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.settings.base_url.trim_end_matches('/'));
        let body = ChatRequest {
            model: &self.settings.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            response_format: ResponseFormat { kind: "json_object" },
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LlmError::RequestFailed(format!(
                "pass '{}' returned HTTP {}",
                request.pass,
                response.status()
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::ParseError(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::ParseError("completion has no content".to_string()))
    }
}

/// Mock client for testing. Returns preconfigured replies keyed by pass name.
#[derive(Default)]
pub struct MockClient {
    replies: HashMap<String, Result<String, String>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the reply text for a pass.
    pub fn with_reply(mut self, pass: impl Into<String>, reply: impl Into<String>) -> Self {
        self.replies.insert(pass.into(), Ok(reply.into()));
        self
    }

    /// Register a failure for a pass.
    pub fn with_failure(mut self, pass: impl Into<String>, message: impl Into<String>) -> Self {
        self.replies.insert(pass.into(), Err(message.into()));
        self
    }
}

#[async_trait]
impl LlmClient for MockClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        match self.replies.get(&request.pass) {
            Some(Ok(reply)) => Ok(reply.clone()),
            Some(Err(message)) => Err(LlmError::RequestFailed(message.clone())),
            None => Err(LlmError::NoReply(request.pass.clone())),
        }
    }
}
