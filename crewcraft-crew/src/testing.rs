//! Test doubles: a provider that replays canned responses, a trivial tool,
//! a reviewer with scripted feedback, and throwaway local HTTP servers.

use crate::review::HumanReview;
use crate::tools::{string_arg, Tool};
use async_trait::async_trait;
use crewcraft_error::Result;
use crewcraft_llm::{CompletionRequest, CompletionResponse, LlmProvider, ProviderError};
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

pub struct ScriptedProvider {
    responses: Mutex<VecDeque<CompletionResponse>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<CompletionResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Plain text answers, one per call
    pub fn texts(answers: &[&str]) -> Self {
        Self::new(
            answers
                .iter()
                .map(|a| CompletionResponse::text("gpt-3.5-turbo", *a))
                .collect(),
        )
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// The user turn of the n-th request
    pub fn user_prompt(&self, n: usize) -> String {
        self.requests()[n].messages[1].content.clone().unwrap_or_default()
    }
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        "gpt-3.5-turbo"
    }

    async fn complete(&self, request: CompletionRequest) -> std::result::Result<CompletionResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(ProviderError::EmptyResponse)
    }
}

pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echo the text back"
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": { "text": { "type": "string" } },
            "required": ["text"]
        })
    }

    async fn call(&self, args: serde_json::Value) -> Result<String> {
        Ok(format!("echo: {}", string_arg(&args, "echo", "text")?))
    }
}

/// Returns queued feedback, then approves everything
pub struct ScriptedReview {
    feedback: Mutex<VecDeque<String>>,
    pub seen: Mutex<Vec<String>>,
}

impl ScriptedReview {
    pub fn new(feedback: &[&str]) -> Self {
        Self {
            feedback: Mutex::new(feedback.iter().map(|s| s.to_string()).collect()),
            seen: Mutex::new(Vec::new()),
        }
    }
}

impl HumanReview for ScriptedReview {
    fn review(&self, _task: &str, output: &str) -> Result<Option<String>> {
        self.seen.lock().unwrap().push(output.to_string());
        Ok(self.feedback.lock().unwrap().pop_front())
    }
}

/// Answer one request with `status` and an HTML `body`; returns the URL
pub async fn serve_once(status: &'static str, body: String) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 4096];
        let _ = socket.read(&mut buf).await;
        let response = format!(
            "HTTP/1.1 {}\r\ncontent-type: text/html\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        let _ = socket.write_all(response.as_bytes()).await;
    });
    format!("http://{}/", addr)
}

/// Accepts connections and never answers
pub async fn silent_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{}/", addr)
}
