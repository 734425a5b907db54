use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadMessage {
    pub role: Role,
    pub text: String,
    /// Which agent produced an assistant message; None for user messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Conversational state for one thread. Owned exclusively by the store;
/// callers only ever see cloned snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationThread {
    pub thread_id: String,
    pub channel_id: String,
    pub user_id: String,
    pub messages: Vec<ThreadMessage>,
    pub current_agent: Option<String>,
    /// Per-agent opaque key-value bags (handoff payloads land here).
    pub scratch: HashMap<String, Map<String, Value>>,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl ConversationThread {
    pub fn new(thread_id: &str, channel_id: &str, user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            thread_id: thread_id.to_string(),
            channel_id: channel_id.to_string(),
            user_id: user_id.to_string(),
            messages: Vec::new(),
            current_agent: None,
            scratch: HashMap::new(),
            created_at: now,
            last_activity: now,
        }
    }

    /// Append a message, then trim if the retained count exceeds `cap`:
    /// keep the seed message (index 0) plus the newest `floor(cap * 0.8)`
    /// messages and drop the middle in one batch. Trimming once per overflow
    /// avoids thrashing the window boundaries on every append.
    pub fn push(&mut self, message: ThreadMessage, cap: usize) {
        self.messages.push(message);
        if cap > 1 && self.messages.len() > cap {
            let keep_tail = cap * 4 / 5;
            let tail_start = self.messages.len() - keep_tail;
            if tail_start > 1 {
                self.messages.drain(1..tail_start);
            }
        }
    }

    pub fn merge_scratch(&mut self, agent_id: &str, payload: Map<String, Value>) {
        let bag = self.scratch.entry(agent_id.to_string()).or_default();
        for (key, value) in payload {
            bag.insert(key, value);
        }
    }

    pub fn idle_duration(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.last_activity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(text: &str) -> ThreadMessage {
        ThreadMessage {
            role: Role::User,
            text: text.to_string(),
            agent_id: None,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_push_no_trim_under_cap() {
        let mut thread = ConversationThread::new("t", "c", "u", Utc::now());
        for i in 0..10 {
            thread.push(msg(&format!("m{}", i)), 50);
        }
        assert_eq!(thread.messages.len(), 10);
    }

    #[test]
    fn test_push_trims_head_and_tail() {
        let mut thread = ConversationThread::new("t", "c", "u", Utc::now());
        for i in 0..51 {
            thread.push(msg(&format!("m{}", i)), 50);
        }
        // seed + floor(50 * 0.8) = 41 retained
        assert_eq!(thread.messages.len(), 41);
        assert_eq!(thread.messages[0].text, "m0");
        assert_eq!(thread.messages[1].text, "m11");
        assert_eq!(thread.messages.last().unwrap().text, "m50");
    }

    #[test]
    fn test_trim_preserves_relative_order() {
        let mut thread = ConversationThread::new("t", "c", "u", Utc::now());
        for i in 0..60 {
            thread.push(msg(&format!("m{}", i)), 50);
        }
        let texts: Vec<&str> = thread.messages.iter().map(|m| m.text.as_str()).collect();
        let mut sorted = texts.clone();
        sorted.sort_by_key(|t| t[1..].parse::<u32>().unwrap());
        assert_eq!(texts, sorted);
        assert_eq!(texts[0], "m0");
    }

    #[test]
    fn test_merge_scratch_overwrites_keys() {
        let mut thread = ConversationThread::new("t", "c", "u", Utc::now());
        let mut first = Map::new();
        first.insert("topic".to_string(), "btc".into());
        first.insert("depth".to_string(), "brief".into());
        thread.merge_scratch("research", first);

        let mut second = Map::new();
        second.insert("depth".to_string(), "full".into());
        thread.merge_scratch("research", second);

        let bag = thread.scratch.get("research").unwrap();
        assert_eq!(bag["topic"], "btc");
        assert_eq!(bag["depth"], "full");
    }
}
