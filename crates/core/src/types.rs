use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Reserved tool name an agent uses to redirect the rest of the turn to a
/// different agent. Advertised by the dispatch loop, never registered as a
/// real capability.
pub const HANDOFF_TOOL: &str = "handoff";

/// A tool call request that serializes to the OpenAI-compatible format:
/// `{id, type: "function", function: {name, arguments}}`
#[derive(Debug, Clone)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

impl Serialize for ToolCallRequest {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("id", &self.id)?;
        map.serialize_entry("type", "function")?;
        map.serialize_entry("function", &serde_json::json!({
            "name": self.name,
            "arguments": self.arguments.to_string()
        }))?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for ToolCallRequest {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let obj = value.as_object().ok_or_else(|| serde::de::Error::custom("expected object"))?;

        let id = obj.get("id")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        // Wire format: {id, type, function: {name, arguments}}
        if let Some(func) = obj.get("function").and_then(|v| v.as_object()) {
            let name = func.get("name")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            let arguments = match func.get("arguments") {
                Some(Value::String(s)) => {
                    serde_json::from_str(s).unwrap_or_else(|e| {
                        warn!(error = %e, raw = %s, "Failed to parse tool call arguments as JSON, using empty object");
                        Value::Object(serde_json::Map::new())
                    })
                }
                Some(v) => v.clone(),
                None => Value::Object(serde_json::Map::new()),
            };
            return Ok(ToolCallRequest { id, name, arguments });
        }

        // Flat format: {id, name, arguments}
        let name = obj.get("name")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let arguments = obj.get("arguments")
            .cloned()
            .unwrap_or(Value::Object(serde_json::Map::new()));

        Ok(ToolCallRequest { id, name, arguments })
    }
}

/// Redirect signal lifted out of a model response. The wire encoding is a
/// tool call named [`HANDOFF_TOOL`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandoffSignal {
    pub target: String,
    #[serde(default)]
    pub reason: String,
    /// Opaque payload merged into the target agent's scratch data.
    #[serde(default)]
    pub context: serde_json::Map<String, Value>,
}

impl HandoffSignal {
    /// Remove the first `handoff` tool call from `calls` and parse it.
    /// A malformed handoff call (missing target) is dropped with a warning
    /// rather than surfaced as an error.
    pub fn extract(calls: &mut Vec<ToolCallRequest>) -> Option<Self> {
        let idx = calls.iter().position(|c| c.name == HANDOFF_TOOL)?;
        let call = calls.remove(idx);

        let target = match call.arguments.get("target").and_then(|v| v.as_str()) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => {
                warn!(arguments = %call.arguments, "Handoff call without a target, ignoring");
                return None;
            }
        };
        let reason = call.arguments.get("reason")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let context = call.arguments.get("context")
            .and_then(|v| v.as_object())
            .cloned()
            .unwrap_or_default();

        Some(Self { target, reason, context })
    }
}

/// One model completion: final text, proposed tool calls, or both, plus an
/// optional handoff redirect.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ModelResponse {
    pub text: Option<String>,
    pub tool_calls: Vec<ToolCallRequest>,
    pub handoff: Option<HandoffSignal>,
    pub finish_reason: String,
    pub usage: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallRequest>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ChatMessage {
    pub fn system(content: &str) -> Self {
        Self {
            role: "system".to_string(),
            content: content.to_string(),
            tool_calls: None,
            tool_call_id: None,
            name: None,
        }
    }

    pub fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
            tool_calls: None,
            tool_call_id: None,
            name: None,
        }
    }

    pub fn assistant(content: &str) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.to_string(),
            tool_calls: None,
            tool_call_id: None,
            name: None,
        }
    }

    pub fn assistant_with_calls(content: &str, calls: Vec<ToolCallRequest>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.to_string(),
            tool_calls: Some(calls),
            tool_call_id: None,
            name: None,
        }
    }

    pub fn tool_result(tool_call_id: &str, name: &str, content: &str) -> Self {
        Self {
            role: "tool".to_string(),
            content: content.to_string(),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.to_string()),
            name: Some(name.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(name: &str, arguments: Value) -> ToolCallRequest {
        ToolCallRequest {
            id: "call_0".to_string(),
            name: name.to_string(),
            arguments,
        }
    }

    #[test]
    fn test_tool_call_wire_roundtrip() {
        let original = call("web_search", json!({"query": "rust"}));
        let encoded = serde_json::to_string(&original).unwrap();
        assert!(encoded.contains("\"type\":\"function\""));

        let decoded: ToolCallRequest = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.name, "web_search");
        assert_eq!(decoded.arguments["query"], "rust");
    }

    #[test]
    fn test_tool_call_flat_format() {
        let raw = r#"{"id": "c1", "name": "web_fetch", "arguments": {"url": "http://example.com"}}"#;
        let decoded: ToolCallRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(decoded.name, "web_fetch");
        assert_eq!(decoded.arguments["url"], "http://example.com");
    }

    #[test]
    fn test_handoff_extract() {
        let mut calls = vec![
            call("web_search", json!({"query": "btc"})),
            call(HANDOFF_TOOL, json!({
                "target": "research",
                "reason": "needs sources",
                "context": {"topic": "btc"}
            })),
        ];
        let handoff = HandoffSignal::extract(&mut calls).unwrap();
        assert_eq!(handoff.target, "research");
        assert_eq!(handoff.reason, "needs sources");
        assert_eq!(handoff.context["topic"], "btc");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "web_search");
    }

    #[test]
    fn test_handoff_extract_missing_target() {
        let mut calls = vec![call(HANDOFF_TOOL, json!({"reason": "no target"}))];
        assert!(HandoffSignal::extract(&mut calls).is_none());
        assert!(calls.is_empty());
    }

    #[test]
    fn test_handoff_extract_no_handoff() {
        let mut calls = vec![call("current_time", json!({}))];
        assert!(HandoffSignal::extract(&mut calls).is_none());
        assert_eq!(calls.len(), 1);
    }
}
