//! Tools agents may call through the model's function-calling interface

mod scrape;
mod search;

pub use scrape::ScrapeWebsiteTool;
pub use search::SerperSearchTool;

use async_trait::async_trait;
use crewcraft_error::{Error, ErrorKind, Result};
use crewcraft_llm::ToolDefinition;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Tools give up on a silent server after this long
pub(crate) const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) crewcraft/0.1";

#[async_trait]
pub trait Tool: Send + Sync {
    /// Function name exposed to the model (`[a-zA-Z0-9_-]+`)
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema of the arguments object
    fn parameters(&self) -> serde_json::Value;

    /// Run the tool; the returned text is handed back to the model verbatim
    async fn call(&self, args: serde_json::Value) -> Result<String>;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(self.name(), self.description()).with_parameters(self.parameters())
    }
}

/// Shared handle, so one tool instance can serve several agents
pub type ToolRef = Arc<dyn Tool>;

pub(crate) fn http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| {
            Error::new(ErrorKind::ConfigInvalid, "failed to create HTTP client")
                .with_operation("tools::http_client")
                .set_source(e)
        })
}

/// Pull a required string argument out of a tool call
pub(crate) fn string_arg<'a>(args: &'a serde_json::Value, tool: &str, key: &str) -> Result<&'a str> {
    args.get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| Error::tool_failed(tool, format!("missing argument '{}'", key)))
}

/// Cut text to at most `max_chars` characters
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}
