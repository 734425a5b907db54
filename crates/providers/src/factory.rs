use std::sync::Arc;
use switchboard_core::Config;
use tracing::info;

use crate::{ModelClient, OpenAIClient};

/// Infer the provider name from a model string prefix, e.g.
/// `openrouter/anthropic/claude-...` or `deepseek-chat`.
pub fn infer_provider_from_model(model: &str) -> Option<&'static str> {
    if model.starts_with("openrouter/") {
        Some("openrouter")
    } else if model.starts_with("deepseek/") || model.starts_with("deepseek-") {
        Some("deepseek")
    } else if model.starts_with("anthropic/") || model.starts_with("claude-") {
        Some("anthropic")
    } else if model.starts_with("openai/") || model.starts_with("gpt-") {
        Some("openai")
    } else if model.starts_with("groq/") {
        Some("groq")
    } else {
        None
    }
}

fn default_api_base(provider: &str) -> &'static str {
    match provider {
        "openrouter" => "https://openrouter.ai/api/v1",
        "deepseek" => "https://api.deepseek.com/v1",
        "groq" => "https://api.groq.com/openai/v1",
        "anthropic" => "https://api.anthropic.com/v1",
        _ => "https://api.openai.com/v1",
    }
}

/// Build a model client for the given model string, resolving the provider
/// from an explicit config override, the model prefix, or the first
/// configured provider, in that order. Returns `None` when no provider has an
/// API key.
pub fn create_model_client(config: &Config, model: &str) -> Option<Arc<dyn ModelClient>> {
    let (configured_name, configured) = config.get_api_key()?;

    let provider = config
        .agents
        .provider
        .as_deref()
        .or_else(|| infer_provider_from_model(model))
        .unwrap_or(configured_name);

    let provider_config = config.get_provider(provider).unwrap_or(configured);
    if provider_config.api_key.is_empty() {
        return None;
    }

    let api_base = provider_config
        .api_base
        .as_deref()
        .unwrap_or_else(|| default_api_base(provider));

    info!(provider, model, api_base, "Creating model client");
    Some(Arc::new(OpenAIClient::new(
        &provider_config.api_key,
        Some(api_base),
        model,
        config.agents.max_tokens,
        config.agents.temperature,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchboard_core::config::ProviderConfig;

    #[test]
    fn test_infer_provider_from_model() {
        assert_eq!(infer_provider_from_model("openrouter/x"), Some("openrouter"));
        assert_eq!(infer_provider_from_model("deepseek-chat"), Some("deepseek"));
        assert_eq!(infer_provider_from_model("gpt-4o-mini"), Some("openai"));
        assert_eq!(infer_provider_from_model("claude-sonnet-4"), Some("anthropic"));
        assert_eq!(infer_provider_from_model("mystery-model"), None);
    }

    #[test]
    fn test_create_without_keys_is_none() {
        let config = Config::default();
        assert!(create_model_client(&config, "gpt-4o-mini").is_none());
    }

    #[test]
    fn test_create_with_key() {
        let mut config = Config::default();
        config.providers.insert(
            "openai".to_string(),
            ProviderConfig {
                api_key: "sk-test".to_string(),
                api_base: None,
            },
        );
        assert!(create_model_client(&config, "gpt-4o-mini").is_some());
    }
}
