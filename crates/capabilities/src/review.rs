use async_trait::async_trait;
use serde_json::{json, Value};
use switchboard_core::{Error, Result};

use crate::{Capability, CapabilityContext, CapabilitySchema};

/// Runs the deterministic quality scorer over a draft so the writer agent can
/// check its own output before sending it to the user.
pub struct ReviewDraftCapability;

#[async_trait]
impl Capability for ReviewDraftCapability {
    fn schema(&self) -> CapabilitySchema {
        CapabilitySchema {
            name: "review_draft",
            description: "Score a draft report against structural, factual-density and style rules. Returns per-dimension scores (0-100), a weighted overall score, a pass flag, and a list of issues with suggested fixes.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "text": {
                        "type": "string",
                        "description": "The full draft text to review"
                    }
                },
                "required": ["text"]
            }),
        }
    }

    fn validate(&self, params: &Value) -> Result<()> {
        if params.get("text").and_then(|v| v.as_str()).is_none() {
            return Err(Error::InvalidArguments {
                capability: "review_draft".to_string(),
                fields: vec!["text".to_string()],
            });
        }
        Ok(())
    }

    async fn execute(&self, ctx: CapabilityContext, params: Value) -> Result<Value> {
        let text = params["text"].as_str().unwrap_or_default();
        let review =
            switchboard_quality::score_with_threshold(text, ctx.config.quality.pass_threshold);
        Ok(serde_json::to_value(review)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchboard_core::Config;

    #[tokio::test]
    async fn test_review_draft_returns_review_json() {
        let cap = ReviewDraftCapability;
        let ctx = CapabilityContext::new("t", "c", "u", Config::default());
        let value = cap
            .execute(ctx, json!({"text": "A short draft with TBD sections."}))
            .await
            .unwrap();
        assert!(value["overall"].is_number());
        assert!(value["passed"].is_boolean());
        assert!(value["issues"].is_array());
    }

    #[test]
    fn test_review_draft_validate() {
        let cap = ReviewDraftCapability;
        assert!(cap.validate(&json!({"text": "x"})).is_ok());
        assert!(cap.validate(&json!({})).is_err());
    }
}
