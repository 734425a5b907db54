use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use switchboard_core::{Error, Result};
use tracing::debug;

use crate::{safe_truncate, Capability, CapabilityContext, CapabilitySchema};

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_FETCH_BYTES: usize = 24_000;
const USER_AGENT: &str = "Mozilla/5.0 (compatible; switchboard/0.1)";

// ============ web_search ============

pub struct WebSearchCapability;

#[async_trait]
impl Capability for WebSearchCapability {
    fn schema(&self) -> CapabilitySchema {
        CapabilitySchema {
            name: "web_search",
            description: "Search the web via the Brave Search API. Tip: set freshness=day for 'last 24 hours' news.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Search query"
                    },
                    "count": {
                        "type": "integer",
                        "description": "Number of results (1-10, default 5)"
                    },
                    "freshness": {
                        "type": "string",
                        "description": "Recency filter",
                        "enum": ["day", "week", "month", "year"]
                    }
                },
                "required": ["query"]
            }),
        }
    }

    fn validate(&self, params: &Value) -> Result<()> {
        if params.get("query").and_then(|v| v.as_str()).map(str::trim).filter(|q| !q.is_empty()).is_none() {
            return Err(Error::InvalidArguments {
                capability: "web_search".to_string(),
                fields: vec!["query".to_string()],
            });
        }
        Ok(())
    }

    async fn execute(&self, ctx: CapabilityContext, params: Value) -> Result<Value> {
        let query = params["query"].as_str().unwrap_or_default();
        let count = params
            .get("count")
            .and_then(|v| v.as_u64())
            .unwrap_or(5)
            .clamp(1, 10) as usize;
        let freshness = params.get("freshness").and_then(|v| v.as_str());

        let api_key = &ctx.config.tools.search.api_key;
        if api_key.is_empty() {
            return Err(Error::ExecutionFailure {
                capability: "web_search".to_string(),
                message: "search API key not configured (tools.search.apiKey)".to_string(),
            });
        }

        let results = brave_search(api_key, query, count, freshness).await?;
        Ok(json!({ "query": query, "results": results }))
    }
}

async fn brave_search(
    api_key: &str,
    query: &str,
    count: usize,
    freshness: Option<&str>,
) -> Result<Vec<Value>> {
    let client = Client::new();
    let mut req = client
        .get("https://api.search.brave.com/res/v1/web/search")
        .header("X-Subscription-Token", api_key)
        .timeout(FETCH_TIMEOUT)
        .query(&[("q", query), ("count", &count.to_string())]);

    if let Some(f) = freshness {
        req = req.query(&[("freshness", f)]);
    }

    let response = req
        .send()
        .await
        .map_err(|e| Error::ExecutionFailure {
            capability: "web_search".to_string(),
            message: format!("search request failed: {}", e),
        })?;

    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        return Err(Error::ExecutionFailure {
            capability: "web_search".to_string(),
            message: format!("search API error {}: {}", status, safe_truncate(&text, 300)),
        });
    }

    let data: Value = response.json().await.map_err(|e| Error::ExecutionFailure {
        capability: "web_search".to_string(),
        message: format!("failed to parse search response: {}", e),
    })?;

    let results: Vec<Value> = data["web"]["results"]
        .as_array()
        .unwrap_or(&vec![])
        .iter()
        .map(|r| {
            json!({
                "title": r["title"],
                "url": r["url"],
                "snippet": r["description"]
            })
        })
        .collect();

    debug!(query, count = results.len(), "Web search completed");
    Ok(results)
}

// ============ web_fetch ============

pub struct WebFetchCapability;

#[async_trait]
impl Capability for WebFetchCapability {
    fn schema(&self) -> CapabilitySchema {
        CapabilitySchema {
            name: "web_fetch",
            description: "Fetch a URL and return its content as markdown. HTML pages are reduced to readable text; other content types are returned raw (truncated).",
            parameters: json!({
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "The URL to fetch (http or https)"
                    }
                },
                "required": ["url"]
            }),
        }
    }

    fn validate(&self, params: &Value) -> Result<()> {
        let mut fields = Vec::new();
        match params.get("url").and_then(|v| v.as_str()) {
            None => fields.push("url".to_string()),
            Some(url) if !url.starts_with("http://") && !url.starts_with("https://") => {
                fields.push("url".to_string())
            }
            _ => {}
        }
        if !fields.is_empty() {
            return Err(Error::InvalidArguments {
                capability: "web_fetch".to_string(),
                fields,
            });
        }
        Ok(())
    }

    async fn execute(&self, _ctx: CapabilityContext, params: Value) -> Result<Value> {
        let url = params["url"].as_str().unwrap_or_default();

        let client = Client::new();
        let response = client
            .get(url)
            .header("User-Agent", USER_AGENT)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
            .map_err(|e| Error::ExecutionFailure {
                capability: "web_fetch".to_string(),
                message: format!("request failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::ExecutionFailure {
                capability: "web_fetch".to_string(),
                message: format!("HTTP {} fetching {}", status, url),
            });
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let body = response.text().await.map_err(|e| Error::ExecutionFailure {
            capability: "web_fetch".to_string(),
            message: format!("failed to read body: {}", e),
        })?;

        let (title, content) = if content_type.contains("text/html") {
            let title = extract_title(&body);
            (title, html_to_markdown(&body))
        } else {
            (None, body)
        };

        let truncated = content.len() > MAX_FETCH_BYTES;
        let content = safe_truncate(&content, MAX_FETCH_BYTES).to_string();

        debug!(url, content_type = %content_type, bytes = content.len(), "Fetched URL");
        Ok(json!({
            "url": url,
            "title": title,
            "content": content,
            "truncated": truncated,
        }))
    }
}

/// Convert a fetched page to markdown, skipping chrome elements so the model
/// sees the article and not the navigation.
fn html_to_markdown(html: &str) -> String {
    use htmd::HtmlToMarkdown;

    let converter = HtmlToMarkdown::builder()
        .skip_tags(vec![
            "script", "style", "nav", "footer", "header", "aside", "noscript", "iframe",
        ])
        .build();

    match converter.convert(html) {
        Ok(markdown) => markdown,
        Err(_) => extract_text_fallback(html),
    }
}

/// Plain-text extraction via scraper when markdown conversion fails.
fn extract_text_fallback(html: &str) -> String {
    let document = scraper::Html::parse_document(html);
    match scraper::Selector::parse("body") {
        Ok(selector) => document
            .select(&selector)
            .next()
            .map(|body| {
                body.text()
                    .collect::<Vec<_>>()
                    .join(" ")
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default(),
        Err(_) => String::new(),
    }
}

fn extract_title(html: &str) -> Option<String> {
    let document = scraper::Html::parse_document(html);
    let selector = scraper::Selector::parse("title").ok()?;
    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}
