//! Web search through the Serper Google Search API

use super::{http_client, string_arg, Tool, HTTP_TIMEOUT};
use async_trait::async_trait;
use crewcraft_error::{Error, ErrorKind, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

const SERPER_URL: &str = "https://google.serper.dev/search";
const N_RESULTS: usize = 10;

pub struct SerperSearchTool {
    client: Client,
    api_key: Option<String>,
}

impl SerperSearchTool {
    /// A missing key is only reported when the tool is actually called
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Ok(Self {
            client: http_client(HTTP_TIMEOUT)?,
            api_key,
        })
    }
}

#[async_trait]
impl Tool for SerperSearchTool {
    fn name(&self) -> &str {
        "search_the_internet"
    }

    fn description(&self) -> &str {
        "Search the internet with a query and return the top results (title, link, snippet)."
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "search_query": {
                    "type": "string",
                    "description": "Mandatory search query you want to use to search the internet"
                }
            },
            "required": ["search_query"]
        })
    }

    async fn call(&self, args: serde_json::Value) -> Result<String> {
        let query = string_arg(&args, self.name(), "search_query")?;
        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| crewcraft_llm::error::missing_credential("SERPER_API_KEY"))?;

        tracing::debug!(%query, "serper search");

        let response = self
            .client
            .post(SERPER_URL)
            .header("X-API-KEY", api_key)
            .json(&SerperRequest { q: query, num: N_RESULTS })
            .send()
            .await
            .map_err(|e| {
                Error::new(ErrorKind::NetworkFailed, e.to_string())
                    .with_operation("serper::search")
                    .set_source(e)
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::tool_failed(self.name(), format!("serper returned {}: {}", status, text))
                .with_context("status", status.to_string()));
        }

        let body: SerperResponse = response.json().await.map_err(|e| {
            Error::parse_failed(format!("unexpected serper response: {}", e)).set_source(e)
        })?;

        Ok(format_results(&body.organic))
    }
}

#[derive(Serialize)]
struct SerperRequest<'a> {
    q: &'a str,
    num: usize,
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<OrganicResult>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    title: String,
    link: String,
    #[serde(default)]
    snippet: String,
}

fn format_results(results: &[OrganicResult]) -> String {
    if results.is_empty() {
        return "No results found.".to_string();
    }
    results
        .iter()
        .map(|r| format!("Title: {}\nLink: {}\nSnippet: {}\n---", r.title, r.link, r.snippet))
        .collect::<Vec<_>>()
        .join("\n")
}
