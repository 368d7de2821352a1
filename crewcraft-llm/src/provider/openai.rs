//! OpenAI chat-completions over HTTP
//!
//! Also serves Azure OpenAI, vLLM, Ollama and anything else that accepts
//! `POST {base}/chat/completions`.

use super::{
    ChatMessage, CompletionRequest, CompletionResponse, FinishReason, LlmProvider, ProviderConfig,
    ProviderError, Role, ToolCall, ToolDefinition, Usage, DEFAULT_MODEL, OPENAI_BASE_URL,
};
use crate::error::{Error, ErrorKind};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

pub struct OpenAIProvider {
    client: Client,
    config: ProviderConfig,
}

impl OpenAIProvider {
    pub fn new(config: ProviderConfig) -> crate::Result<Self> {
        let client = Client::builder().timeout(config.timeout).build().map_err(|e| {
            Error::new(ErrorKind::ConfigInvalid, "failed to create HTTP client")
                .with_operation("openai::new")
                .set_source(e)
        })?;

        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        let base = self.config.base_url.as_deref().unwrap_or(OPENAI_BASE_URL);
        format!("{}/chat/completions", base.trim_end_matches('/'))
    }

    fn body<'a>(&'a self, request: &'a CompletionRequest) -> WireRequest<'a> {
        WireRequest {
            model: request.model.as_deref().unwrap_or_else(|| self.default_model()),
            messages: request.messages.iter().map(WireMessage::from).collect(),
            temperature: request.temperature,
            tools: request.tools.iter().map(WireTool::from).collect(),
            response_format: request.json_mode.then_some(ResponseFormat { r#type: "json_object" }),
        }
    }
}

impl LlmProvider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn default_model(&self) -> &str {
        self.config.default_model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let body = self.body(&request);
        tracing::debug!(
            model = body.model,
            messages = body.messages.len(),
            tools = body.tools.len(),
            json_mode = request.json_mode,
            "chat completion request"
        );

        let mut http = self.client.post(self.endpoint()).json(&body);
        if let Some(key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) {
            http = http.bearer_auth(key);
        }

        let response = http.send().await.map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok());
            let message = response.text().await.unwrap_or_default();
            return Err(status_error(status, retry_after, body.model, message));
        }

        response
            .json::<WireResponse>()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?
            .into_completion()
    }
}

fn status_error(status: StatusCode, retry_after: Option<u64>, model: &str, message: String) -> ProviderError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited { retry_after },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Unauthenticated,
        StatusCode::NOT_FOUND => ProviderError::ModelNotFound(model.to_string()),
        _ => ProviderError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    r#type: &'static str,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: Role,
    content: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<&'a str>,
}

impl<'a> From<&'a ChatMessage> for WireMessage<'a> {
    fn from(msg: &'a ChatMessage) -> Self {
        Self {
            role: msg.role,
            content: msg.content.as_deref(),
            tool_calls: msg.tool_calls.iter().cloned().map(WireToolCall::from).collect(),
            tool_call_id: msg.tool_call_id.as_deref(),
        }
    }
}

#[derive(Serialize)]
struct WireTool<'a> {
    r#type: &'static str,
    function: &'a ToolDefinition,
}

impl<'a> From<&'a ToolDefinition> for WireTool<'a> {
    fn from(function: &'a ToolDefinition) -> Self {
        Self {
            r#type: "function",
            function,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(default = "function_type")]
    r#type: String,
    function: WireFunctionCall,
}

fn function_type() -> String {
    "function".into()
}

#[derive(Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    arguments: String,
}

impl From<ToolCall> for WireToolCall {
    fn from(call: ToolCall) -> Self {
        Self {
            id: call.id,
            r#type: function_type(),
            function: WireFunctionCall {
                name: call.name,
                arguments: call.arguments,
            },
        }
    }
}

impl From<WireToolCall> for ToolCall {
    fn from(call: WireToolCall) -> Self {
        Self {
            id: call.id,
            name: call.function.name,
            arguments: call.function.arguments,
        }
    }
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    id: String,
    model: String,
    choices: Vec<WireChoice>,
    #[serde(default)]
    usage: Usage,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireAnswer,
    finish_reason: Option<FinishReason>,
}

#[derive(Deserialize)]
struct WireAnswer {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<WireToolCall>,
}

impl WireResponse {
    fn into_completion(self) -> Result<CompletionResponse, ProviderError> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Parse("completion has no choices".into()))?;

        Ok(CompletionResponse {
            id: self.id,
            model: self.model,
            content: choice.message.content,
            tool_calls: choice.message.tool_calls.into_iter().map(ToolCall::from).collect(),
            finish_reason: choice.finish_reason.unwrap_or(FinishReason::Unknown),
            usage: self.usage,
        })
    }
}
