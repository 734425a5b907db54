use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use switchboard_core::Result;

use crate::{Capability, CapabilityContext, CapabilitySchema};

pub struct CurrentTimeCapability;

#[async_trait]
impl Capability for CurrentTimeCapability {
    fn schema(&self) -> CapabilitySchema {
        CapabilitySchema {
            name: "current_time",
            description: "Get the current date and time (UTC).",
            parameters: json!({
                "type": "object",
                "properties": {}
            }),
        }
    }

    fn validate(&self, _params: &Value) -> Result<()> {
        Ok(())
    }

    async fn execute(&self, _ctx: CapabilityContext, _params: Value) -> Result<Value> {
        let now = Utc::now();
        Ok(json!({
            "utc": now.to_rfc3339(),
            "date": now.format("%Y-%m-%d").to_string(),
            "weekday": now.format("%A").to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchboard_core::Config;

    #[tokio::test]
    async fn test_current_time_shape() {
        let cap = CurrentTimeCapability;
        let ctx = CapabilityContext::new("t", "c", "u", Config::default());
        let value = cap.execute(ctx, json!({})).await.unwrap();
        assert!(value["utc"].as_str().unwrap().contains('T'));
        assert_eq!(value["date"].as_str().unwrap().len(), 10);
    }
}
