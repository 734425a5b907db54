use std::collections::HashMap;
use std::sync::Arc;

use futures::FutureExt;
use serde::Serialize;
use serde_json::{json, Value};
use switchboard_core::{Error, Result};
use tracing::{debug, warn};

use crate::clock::CurrentTimeCapability;
use crate::review::ReviewDraftCapability;
use crate::web::{WebFetchCapability, WebSearchCapability};
use crate::{Capability, CapabilityContext};

/// Result of one capability invocation, fed back to the model as data.
/// Invocation never returns `Err`: schema violations and executor faults are
/// folded into the variants below so a bad tool call cannot take down the
/// dispatch loop.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolOutcome {
    Success { value: Value },
    InvalidArguments { fields: Vec<String> },
    Failure { message: String },
}

impl ToolOutcome {
    pub fn is_err(&self) -> bool {
        !matches!(self, ToolOutcome::Success { .. })
    }

    /// JSON payload handed back to the model in the follow-up completion.
    pub fn payload(&self) -> Value {
        match self {
            ToolOutcome::Success { value } => value.clone(),
            ToolOutcome::InvalidArguments { fields } => json!({
                "error": "invalid arguments",
                "fields": fields,
            }),
            ToolOutcome::Failure { message } => json!({ "error": message }),
        }
    }
}

/// One executed tool call paired with its outcome, kept for the duration of a
/// single dispatch invocation.
#[derive(Debug, Clone)]
pub struct ToolRecord {
    pub call: switchboard_core::types::ToolCallRequest,
    pub outcome: ToolOutcome,
}

pub struct CapabilityRegistry {
    capabilities: HashMap<String, Arc<dyn Capability>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self {
            capabilities: HashMap::new(),
        }
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        // register() only fails on a duplicate name; the built-in set is
        // statically unique.
        let _ = registry.register(Arc::new(WebSearchCapability));
        let _ = registry.register(Arc::new(WebFetchCapability));
        let _ = registry.register(Arc::new(ReviewDraftCapability));
        let _ = registry.register(Arc::new(CurrentTimeCapability));
        registry
    }

    pub fn register(&mut self, capability: Arc<dyn Capability>) -> Result<()> {
        let name = capability.schema().name;
        if self.capabilities.contains_key(name) {
            return Err(Error::DuplicateCapability(name.to_string()));
        }
        debug!(name, "Registering capability");
        self.capabilities.insert(name.to_string(), capability);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<&Arc<dyn Capability>> {
        self.capabilities
            .get(name)
            .ok_or_else(|| Error::CapabilityNotFound(name.to_string()))
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.capabilities.keys().cloned().collect();
        names.sort();
        names
    }

    /// Function schemas for the given allowlist, in OpenAI tool format.
    /// Unknown names are skipped; the profile table validates allowlists at
    /// startup, so a miss here only happens in hand-built tests.
    pub fn schemas_for(&self, allowlist: &[&str]) -> Vec<Value> {
        allowlist
            .iter()
            .filter_map(|name| self.capabilities.get(*name))
            .map(|capability| {
                let schema = capability.schema();
                json!({
                    "type": "function",
                    "function": {
                        "name": schema.name,
                        "description": schema.description,
                        "parameters": schema.parameters
                    }
                })
            })
            .collect()
    }

    /// Validate and execute one proposed tool call. Every failure mode —
    /// unknown name, schema violation, executor error, executor panic —
    /// becomes a `ToolOutcome` the model can read and explain.
    pub async fn invoke(&self, name: &str, ctx: CapabilityContext, params: Value) -> ToolOutcome {
        let capability = match self.capabilities.get(name) {
            Some(c) => c,
            None => {
                warn!(capability = name, "Unknown capability requested");
                return ToolOutcome::Failure {
                    message: format!("unknown capability: {}", name),
                };
            }
        };

        if let Err(e) = capability.validate(&params) {
            warn!(capability = name, error = %e, "Capability validation failed");
            let fields = match e {
                Error::InvalidArguments { fields, .. } => fields,
                other => vec![other.to_string()],
            };
            return ToolOutcome::InvalidArguments { fields };
        }

        debug!(capability = name, "Executing capability");
        let result = std::panic::AssertUnwindSafe(capability.execute(ctx, params))
            .catch_unwind()
            .await;

        match result {
            Ok(Ok(value)) => ToolOutcome::Success { value },
            Ok(Err(e)) => {
                warn!(capability = name, error = %e, "Capability execution failed");
                ToolOutcome::Failure {
                    message: e.to_string(),
                }
            }
            Err(_) => {
                warn!(capability = name, "Capability executor panicked");
                ToolOutcome::Failure {
                    message: format!("capability {} panicked during execution", name),
                }
            }
        }
    }
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CapabilitySchema;
    use async_trait::async_trait;
    use switchboard_core::Config;

    struct EchoCapability;

    #[async_trait]
    impl Capability for EchoCapability {
        fn schema(&self) -> CapabilitySchema {
            CapabilitySchema {
                name: "echo",
                description: "Echo the input back.",
                parameters: json!({
                    "type": "object",
                    "properties": { "text": { "type": "string" } },
                    "required": ["text"]
                }),
            }
        }

        fn validate(&self, params: &Value) -> Result<()> {
            if params.get("text").and_then(|v| v.as_str()).is_none() {
                return Err(Error::InvalidArguments {
                    capability: "echo".to_string(),
                    fields: vec!["text".to_string()],
                });
            }
            Ok(())
        }

        async fn execute(&self, _ctx: CapabilityContext, params: Value) -> Result<Value> {
            Ok(json!({ "echo": params["text"] }))
        }
    }

    struct FailingCapability;

    #[async_trait]
    impl Capability for FailingCapability {
        fn schema(&self) -> CapabilitySchema {
            CapabilitySchema {
                name: "failing",
                description: "Always fails.",
                parameters: json!({ "type": "object", "properties": {} }),
            }
        }

        fn validate(&self, _params: &Value) -> Result<()> {
            Ok(())
        }

        async fn execute(&self, _ctx: CapabilityContext, _params: Value) -> Result<Value> {
            Err(Error::ExecutionFailure {
                capability: "failing".to_string(),
                message: "upstream unavailable".to_string(),
            })
        }
    }

    struct PanickingCapability;

    #[async_trait]
    impl Capability for PanickingCapability {
        fn schema(&self) -> CapabilitySchema {
            CapabilitySchema {
                name: "panicking",
                description: "Panics.",
                parameters: json!({ "type": "object", "properties": {} }),
            }
        }

        fn validate(&self, _params: &Value) -> Result<()> {
            Ok(())
        }

        async fn execute(&self, _ctx: CapabilityContext, _params: Value) -> Result<Value> {
            panic!("boom");
        }
    }

    fn ctx() -> CapabilityContext {
        CapabilityContext::new("t1", "c1", "u1", Config::default())
    }

    #[test]
    fn test_register_duplicate_fails() {
        let mut registry = CapabilityRegistry::new();
        registry.register(Arc::new(EchoCapability)).unwrap();
        let err = registry.register(Arc::new(EchoCapability)).unwrap_err();
        assert!(matches!(err, Error::DuplicateCapability(name) if name == "echo"));
    }

    #[test]
    fn test_lookup_not_found() {
        let registry = CapabilityRegistry::new();
        let Err(err) = registry.lookup("missing") else {
            panic!("expected lookup of missing capability to fail");
        };
        assert!(matches!(err, Error::CapabilityNotFound(_)));
    }

    #[test]
    fn test_builtins_registered() {
        let registry = CapabilityRegistry::with_builtins();
        assert!(registry.lookup("web_search").is_ok());
        assert!(registry.lookup("web_fetch").is_ok());
        assert!(registry.lookup("review_draft").is_ok());
        assert!(registry.lookup("current_time").is_ok());
    }

    #[test]
    fn test_schemas_for_allowlist() {
        let registry = CapabilityRegistry::with_builtins();
        let schemas = registry.schemas_for(&["web_search", "web_fetch"]);
        assert_eq!(schemas.len(), 2);
        for schema in &schemas {
            assert_eq!(schema["type"], "function");
            assert!(schema["function"]["name"].is_string());
        }
    }

    #[tokio::test]
    async fn test_invoke_success() {
        let mut registry = CapabilityRegistry::new();
        registry.register(Arc::new(EchoCapability)).unwrap();
        let outcome = registry.invoke("echo", ctx(), json!({"text": "hi"})).await;
        match outcome {
            ToolOutcome::Success { value } => assert_eq!(value["echo"], "hi"),
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invoke_invalid_arguments() {
        let mut registry = CapabilityRegistry::new();
        registry.register(Arc::new(EchoCapability)).unwrap();
        let outcome = registry.invoke("echo", ctx(), json!({})).await;
        match outcome {
            ToolOutcome::InvalidArguments { fields } => {
                assert_eq!(fields, vec!["text".to_string()])
            }
            other => panic!("expected invalid arguments, got {:?}", other),
        }
        let payload = registry.invoke("echo", ctx(), json!({})).await.payload();
        assert_eq!(payload["error"], "invalid arguments");
    }

    #[tokio::test]
    async fn test_invoke_unknown_capability_is_failure() {
        let registry = CapabilityRegistry::new();
        let outcome = registry.invoke("nope", ctx(), json!({})).await;
        assert!(outcome.is_err());
    }

    #[tokio::test]
    async fn test_invoke_executor_error_becomes_failure() {
        let mut registry = CapabilityRegistry::new();
        registry.register(Arc::new(FailingCapability)).unwrap();
        let outcome = registry.invoke("failing", ctx(), json!({})).await;
        match outcome {
            ToolOutcome::Failure { message } => assert!(message.contains("upstream unavailable")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invoke_executor_panic_becomes_failure() {
        let mut registry = CapabilityRegistry::new();
        registry.register(Arc::new(PanickingCapability)).unwrap();
        let outcome = registry.invoke("panicking", ctx(), json!({})).await;
        match outcome {
            ToolOutcome::Failure { message } => assert!(message.contains("panicked")),
            other => panic!("expected failure, got {:?}", other),
        }
    }
}
