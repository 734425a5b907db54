pub mod clock;
pub mod registry;
pub mod review;
pub mod web;

use async_trait::async_trait;
use serde_json::Value;
use switchboard_core::{Config, Result};

pub use registry::{CapabilityRegistry, ToolOutcome, ToolRecord};

/// Truncate a string to at most `max_bytes` bytes, respecting UTF-8 char
/// boundaries.
pub fn safe_truncate(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Per-invocation context handed to every executor. Network credentials come
/// in through `config`; thread coordinates let executors tag side effects.
#[derive(Clone)]
pub struct CapabilityContext {
    pub thread_id: String,
    pub channel_id: String,
    pub user_id: String,
    pub config: Config,
}

impl CapabilityContext {
    pub fn new(thread_id: &str, channel_id: &str, user_id: &str, config: Config) -> Self {
        Self {
            thread_id: thread_id.to_string(),
            channel_id: channel_id.to_string(),
            user_id: user_id.to_string(),
            config,
        }
    }
}

pub struct CapabilitySchema {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

#[async_trait]
pub trait Capability: Send + Sync {
    fn schema(&self) -> CapabilitySchema;
    fn validate(&self, params: &Value) -> Result<()>;
    async fn execute(&self, ctx: CapabilityContext, params: Value) -> Result<Value>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_truncate_ascii() {
        assert_eq!(safe_truncate("hello", 3), "hel");
        assert_eq!(safe_truncate("hello", 10), "hello");
    }

    #[test]
    fn test_safe_truncate_multibyte() {
        let s = "héllo";
        // 'é' is 2 bytes starting at index 1; cutting at 2 must back off to 1
        assert_eq!(safe_truncate(s, 2), "h");
    }
}
