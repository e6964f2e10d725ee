//! Web search through the Serper Google Search API
//!
//! SECURITY: SERPER_API_KEY is only sent to the configured search endpoint.

use super::{Tool, ToolResult};
use crate::config::SearchConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

pub struct SerperSearchTool {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    results: usize,
}

impl SerperSearchTool {
    pub fn new(api_key: impl Into<String>, config: &SearchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        let base = url::Url::parse(&config.base_url)
            .with_context(|| format!("Invalid search.base_url: {}", config.base_url))?;
        let endpoint = format!("{}/search", base.as_str().trim_end_matches('/'));

        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint,
            results: config.results.max(1),
        })
    }

    fn format_results(results: &[OrganicResult]) -> String {
        results
            .iter()
            .map(|r| {
                format!(
                    "Title: {}\nLink: {}\nSnippet: {}",
                    r.title,
                    r.link,
                    r.snippet.as_deref().unwrap_or("")
                )
            })
            .collect::<Vec<_>>()
            .join("\n---\n")
    }
}

#[async_trait]
impl Tool for SerperSearchTool {
    fn name(&self) -> &str {
        "search_internet"
    }

    fn description(&self) -> &str {
        "Search the internet with a query and return the top results \
         (title, link and snippet). Use it for current market data, \
         competitors, technologies and costs."
    }

    fn parameters(&self) -> Value {
        json!({
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

    async fn execute(&self, params: Value) -> Result<ToolResult> {
        let query = params
            .get("search_query")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .unwrap_or("");
        if query.is_empty() {
            return Ok(ToolResult::error("search_query must not be empty"));
        }

        tracing::debug!(query, "Searching the internet");

        let response = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", &self.api_key)
            .json(&SearchRequest {
                q: query,
                num: self.results,
            })
            .send()
            .await
            .context("Failed to reach search API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Ok(ToolResult::error(format!(
                "Search API error {}: {}",
                status, body
            )));
        }

        let body: SearchResponse = response
            .json()
            .await
            .context("Failed to parse search response")?;

        let organic: Vec<OrganicResult> = body.organic.into_iter().take(self.results).collect();
        if organic.is_empty() {
            return Ok(ToolResult::success(format!(
                "No results found for '{}'",
                query
            )));
        }

        Ok(ToolResult::success(Self::format_results(&organic)))
    }
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    q: &'a str,
    num: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    organic: Vec<OrganicResult>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    title: String,
    link: String,
    #[serde(default)]
    snippet: Option<String>,
}
