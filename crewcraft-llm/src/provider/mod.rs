//! # LLM Provider Interface
//!
//! Everything a crew needs from a chat-completion backend:
//! - `LlmProvider`: one async `complete` call
//! - `OpenAIProvider`: the OpenAI wire format, which most hosted and local
//!   servers also speak
//! - request/response records with function calling and JSON mode
//! - `UsageTracker` for token totals

mod message;
pub mod openai;
mod usage;

pub use message::{ChatMessage, Role, ToolCall, ToolDefinition};
pub use openai::OpenAIProvider;
pub use usage::{Usage, UsageTracker};

use serde::Deserialize;
use std::time::Duration;

/// Model for every agent and for the hierarchical manager
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    /// Falls back to the provider's default model
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub tools: Vec<ToolDefinition>,
    /// Constrain the answer to a single JSON object
    pub json_mode: bool,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_json_mode(mut self, json_mode: bool) -> Self {
        self.json_mode = json_mode;
        self
    }
}

#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub id: String,
    pub model: String,
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    pub finish_reason: FinishReason,
    pub usage: Usage,
}

impl CompletionResponse {
    /// A finished text answer with no tool calls
    pub fn text(model: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            model: model.into(),
            content: Some(content.into()),
            tool_calls: Vec::new(),
            finish_reason: FinishReason::Stop,
            usage: Usage::default(),
        }
    }

    pub fn wants_tools(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
    #[serde(other)]
    Unknown,
}

/// What can go wrong talking to a backend
#[derive(Debug)]
pub enum ProviderError {
    /// The request never got an HTTP answer
    Network(String),
    /// Non-success status not covered below
    Api { status: u16, message: String },
    /// The body was not a chat completion
    Parse(String),
    RateLimited { retry_after: Option<u64> },
    ModelNotFound(String),
    /// The API key was missing or rejected
    Unauthenticated,
    /// Neither text nor tool calls came back
    EmptyResponse,
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network(e) => write!(f, "request failed: {}", e),
            Self::Api { status, message } => write!(f, "backend answered {}: {}", status, message),
            Self::Parse(e) => write!(f, "unreadable completion: {}", e),
            Self::RateLimited { retry_after: Some(secs) } => {
                write!(f, "rate limited, retry after {}s", secs)
            }
            Self::RateLimited { retry_after: None } => write!(f, "rate limited"),
            Self::ModelNotFound(model) => write!(f, "model '{}' does not exist", model),
            Self::Unauthenticated => write!(f, "API key missing or rejected"),
            Self::EmptyResponse => write!(f, "model returned an empty answer"),
        }
    }
}

impl std::error::Error for ProviderError {}

/// A chat-completion backend
#[allow(async_fn_in_trait)]
pub trait LlmProvider: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &str;

    fn default_model(&self) -> &str;

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    OpenAI,
    /// A self-hosted OpenAI-compatible server, usually keyless
    Local,
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub provider_type: ProviderType,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub default_model: Option<String>,
    pub timeout: Duration,
}

impl ProviderConfig {
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self {
            provider_type: ProviderType::OpenAI,
            api_key: Some(api_key.into()),
            base_url: Some(OPENAI_BASE_URL.into()),
            default_model: Some(DEFAULT_MODEL.into()),
            timeout: Duration::from_secs(120),
        }
    }

    /// vLLM, Ollama, LM Studio and the like
    pub fn local(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider_type: ProviderType::Local,
            api_key: None,
            base_url: Some(base_url.into()),
            default_model: Some(model.into()),
            timeout: Duration::from_secs(300),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}
