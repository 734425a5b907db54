use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use switchboard_core::types::{ChatMessage, HandoffSignal, ModelResponse, ToolCallRequest};
use switchboard_core::{Error, Result};
use tracing::{debug, error, info};

use crate::ModelClient;

/// Find the largest byte index <= `max_bytes` that is a valid char boundary.
fn truncate_at_char_boundary(s: &str, max_bytes: usize) -> usize {
    if max_bytes >= s.len() {
        return s.len();
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    end
}

/// Chat-completions client for OpenAI-compatible APIs (OpenAI, OpenRouter,
/// DeepSeek, Groq). Tool schemas go through the native `tools` parameter.
pub struct OpenAIClient {
    client: Client,
    api_key: String,
    api_base: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAIClient {
    pub fn new(
        api_key: &str,
        api_base: Option<&str>,
        model: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Self {
        let resolved_base = api_base
            .unwrap_or("https://api.openai.com/v1")
            .trim_end_matches('/')
            .to_string();
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_default();
        Self {
            client,
            api_key: api_key.to_string(),
            api_base: resolved_base,
            model: model.to_string(),
            max_tokens,
            temperature,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<String>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    id: String,
    function: FunctionCall,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    name: String,
    arguments: String,
}

fn to_model_response(response: ChatResponse) -> Result<ModelResponse> {
    let usage = response.usage.unwrap_or(Value::Null);
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| Error::Provider("No choices in response".to_string()))?;

    let mut tool_calls: Vec<ToolCallRequest> = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|tc| {
            let arguments: Value = serde_json::from_str(&tc.function.arguments)
                .unwrap_or(Value::Object(serde_json::Map::new()));
            ToolCallRequest {
                id: tc.id,
                name: tc.function.name,
                arguments,
            }
        })
        .collect();

    let handoff = HandoffSignal::extract(&mut tool_calls);
    let text = choice.message.content.filter(|c| !c.is_empty());

    Ok(ModelResponse {
        text,
        tool_calls,
        handoff,
        finish_reason: choice.finish_reason.unwrap_or_else(|| "stop".to_string()),
        usage,
    })
}

#[async_trait]
impl ModelClient for OpenAIClient {
    async fn complete(&self, messages: &[ChatMessage], tools: &[Value]) -> Result<ModelResponse> {
        let url = format!("{}/chat/completions", self.api_base);

        let request = ChatRequest {
            model: self.model.clone(),
            messages: messages.to_vec(),
            tools: tools.to_vec(),
            tool_choice: if tools.is_empty() {
                None
            } else {
                Some("auto".to_string())
            },
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        info!(url = %url, model = %self.model, tools_count = tools.len(), messages_count = messages.len(), "Calling model");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Provider(format!("Request failed: {}", e)))?;

        let status = response.status();
        let raw_body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            error!(status = %status, body = %raw_body, "Model API error");
            return Err(Error::Provider(format!("API error {}: {}", status, raw_body)));
        }

        debug!(body_len = raw_body.len(), "Model raw response");

        let chat_response: ChatResponse = serde_json::from_str(&raw_body).map_err(|e| {
            let end = truncate_at_char_boundary(&raw_body, 500);
            Error::Provider(format!("Failed to parse response: {}. Body: {}", e, &raw_body[..end]))
        })?;

        to_model_response(chat_response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text_only_response() {
        let raw = r#"{
            "choices": [{
                "message": { "content": "Hello there." },
                "finish_reason": "stop"
            }],
            "usage": { "total_tokens": 12 }
        }"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        let response = to_model_response(parsed).unwrap();
        assert_eq!(response.text.as_deref(), Some("Hello there."));
        assert!(response.tool_calls.is_empty());
        assert!(response.handoff.is_none());
        assert_eq!(response.finish_reason, "stop");
    }

    #[test]
    fn test_parse_tool_call_response() {
        let raw = r#"{
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {
                            "name": "web_search",
                            "arguments": "{\"query\": \"rust async\"}"
                        }
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        }"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        let response = to_model_response(parsed).unwrap();
        assert!(response.text.is_none());
        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.tool_calls[0].name, "web_search");
        assert_eq!(response.tool_calls[0].arguments["query"], "rust async");
    }

    #[test]
    fn test_handoff_lifted_from_tool_calls() {
        let raw = r#"{
            "choices": [{
                "message": {
                    "content": "Passing this to research.",
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {
                            "name": "handoff",
                            "arguments": "{\"target\": \"research\", \"reason\": \"needs sources\"}"
                        }
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        }"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        let response = to_model_response(parsed).unwrap();
        let handoff = response.handoff.unwrap();
        assert_eq!(handoff.target, "research");
        assert!(response.tool_calls.is_empty());
        assert_eq!(response.text.as_deref(), Some("Passing this to research."));
    }

    #[test]
    fn test_malformed_arguments_fall_back_to_empty() {
        let raw = r#"{
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": { "name": "web_fetch", "arguments": "not json" }
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        }"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        let response = to_model_response(parsed).unwrap();
        assert_eq!(response.tool_calls[0].arguments, serde_json::json!({}));
    }

    #[test]
    fn test_empty_choices_is_error() {
        let parsed: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(to_model_response(parsed).is_err());
    }
}
