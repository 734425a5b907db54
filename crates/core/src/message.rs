use serde::{Deserialize, Serialize};

/// One message of the normalized transport request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportMessage {
    pub role: String,
    pub text: String,
}

/// Normalized inbound request handed over by a transport collaborator.
/// Webhook parsing, signature verification and platform formatting all happen
/// before this struct is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchRequest {
    pub user_id: String,
    pub thread_id: String,
    pub channel_id: String,
    pub messages: Vec<TransportMessage>,
}

impl DispatchRequest {
    pub fn new(user_id: &str, thread_id: &str, channel_id: &str, text: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            thread_id: thread_id.to_string(),
            channel_id: channel_id.to_string(),
            messages: vec![TransportMessage {
                role: "user".to_string(),
                text: text.to_string(),
            }],
        }
    }

    /// The utterance driving this turn: the last user-role message.
    pub fn latest_user_text(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.text.as_str())
            .unwrap_or_default()
    }
}

/// Final reply returned to the transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchReply {
    pub text: String,
    pub agent_id: String,
    pub capabilities_used: Vec<String>,
}

/// Progress notifications published while a turn is in flight, for transports
/// that render typing indicators or step-by-step status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StageEvent {
    Routing,
    Thinking { agent: String },
    ToolCall { name: String },
    Responding { agent: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_user_text_skips_assistant() {
        let mut req = DispatchRequest::new("u1", "t1", "c1", "first");
        req.messages.push(TransportMessage {
            role: "assistant".to_string(),
            text: "reply".to_string(),
        });
        req.messages.push(TransportMessage {
            role: "user".to_string(),
            text: "second".to_string(),
        });
        assert_eq!(req.latest_user_text(), "second");
    }

    #[test]
    fn test_latest_user_text_empty() {
        let req = DispatchRequest {
            user_id: "u".into(),
            thread_id: "t".into(),
            channel_id: "c".into(),
            messages: vec![],
        };
        assert_eq!(req.latest_user_text(), "");
    }

    #[test]
    fn test_stage_event_wire_format() {
        let encoded = serde_json::to_string(&StageEvent::ToolCall {
            name: "web_search".to_string(),
        })
        .unwrap();
        assert_eq!(encoded, r#"{"type":"tool_call","name":"web_search"}"#);
    }
}
