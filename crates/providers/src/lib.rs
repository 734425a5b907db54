pub mod factory;
pub mod openai;

use async_trait::async_trait;
use serde_json::Value;
use switchboard_core::types::{ChatMessage, ModelResponse};
use switchboard_core::Result;

/// The model boundary: one completion per call, given the assembled message
/// list and the capability schemas the current agent is allowed to use.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage], tools: &[Value]) -> Result<ModelResponse>;
}

pub use factory::{create_model_client, infer_provider_from_model};
pub use openai::OpenAIClient;
