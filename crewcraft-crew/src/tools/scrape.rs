//! Fetch a web page and hand its content to the model as markdown

use super::{http_client, string_arg, truncate_chars, Tool, HTTP_TIMEOUT};
use async_trait::async_trait;
use crewcraft_error::{Error, ErrorKind, Result};
use reqwest::{Client, Response};

/// Pages are cut to this many characters before reaching the model
const MAX_CHARS: usize = 12_000;

/// HTML read per page; the rest of the body is never downloaded
const MAX_BODY_BYTES: usize = 1024 * 1024;

pub struct ScrapeWebsiteTool {
    client: Client,
    max_chars: usize,
    max_body_bytes: usize,
}

impl ScrapeWebsiteTool {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: http_client(HTTP_TIMEOUT)?,
            max_chars: MAX_CHARS,
            max_body_bytes: MAX_BODY_BYTES,
        })
    }
}

#[async_trait]
impl Tool for ScrapeWebsiteTool {
    fn name(&self) -> &str {
        "read_website_content"
    }

    fn description(&self) -> &str {
        "Read a website's content. Returns the page converted to markdown."
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "website_url": {
                    "type": "string",
                    "description": "Mandatory website url to read the file"
                }
            },
            "required": ["website_url"]
        })
    }

    async fn call(&self, args: serde_json::Value) -> Result<String> {
        let url = string_arg(&args, self.name(), "website_url")?;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::tool_failed(self.name(), format!("not an http(s) url: {}", url)));
        }

        tracing::debug!(%url, "scraping website");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| {
                Error::new(ErrorKind::NetworkFailed, e.to_string())
                    .with_operation("scrape::fetch")
                    .with_context("url", url)
                    .set_source(e)
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            return Err(Error::tool_failed(self.name(), format!("{} returned {}", url, status))
                .with_context("status", status.to_string()));
        }

        let body = read_capped(response, self.max_body_bytes).await.map_err(|e| {
            Error::new(ErrorKind::NetworkFailed, e.to_string())
                .with_operation("scrape::read")
                .with_context("url", url)
                .set_source(e)
        })?;
        let html = String::from_utf8_lossy(&body);

        Ok(truncate_chars(&html_to_text(&html), self.max_chars))
    }
}

/// Body bytes up to `limit`; stops pulling chunks once it is reached
async fn read_capped(mut response: Response, limit: usize) -> reqwest::Result<Vec<u8>> {
    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        let room = limit - body.len();
        body.extend_from_slice(&chunk[..chunk.len().min(room)]);
        if body.len() >= limit {
            tracing::debug!(limit, "page body cut at byte limit");
            break;
        }
    }
    Ok(body)
}

/// Markdown when the HTML converts cleanly, the raw body otherwise
fn html_to_text(html: &str) -> String {
    match htmd::convert(html) {
        Ok(markdown) => collapse_blank_lines(&markdown),
        Err(e) => {
            tracing::warn!(error = %e, "html conversion failed, using raw body");
            html.to_string()
        }
    }
}

fn collapse_blank_lines(text: &str) -> String {
    let mut out = Vec::new();
    let mut blank = false;
    for line in text.lines().map(str::trim_end) {
        if line.is_empty() {
            if !blank {
                out.push(line);
            }
            blank = true;
        } else {
            out.push(line);
            blank = false;
        }
    }
    out.join("\n").trim().to_string()
}
