use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::Result;
use crate::paths::Paths;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_base: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSettings {
    #[serde(default = "default_model")]
    pub model: String,
    /// Cheaper/faster model for the Fast tier and the fallback classifier.
    /// Falls back to `model` when unset.
    #[serde(default)]
    pub fast_model: Option<String>,
    /// Model for the Advanced tier. Falls back to `model` when unset.
    #[serde(default)]
    pub advanced_model: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_llm_max_retries")]
    pub llm_max_retries: u32,
    #[serde(default = "default_llm_retry_delay_ms")]
    pub llm_retry_delay_ms: u64,
    #[serde(default = "default_handoff_cap")]
    pub handoff_cap: u32,
    #[serde(default = "default_default_agent")]
    pub default_agent: String,
    /// Explicit provider name (optional). Inferred from the model string
    /// prefix when unset.
    #[serde(default)]
    pub provider: Option<String>,
}

fn default_model() -> String {
    "anthropic/claude-sonnet-4-20250514".to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f32 {
    0.7
}

fn default_llm_max_retries() -> u32 {
    2
}

fn default_llm_retry_delay_ms() -> u64 {
    2000
}

fn default_handoff_cap() -> u32 {
    1
}

fn default_default_agent() -> String {
    "general".to_string()
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            fast_model: None,
            advanced_model: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            llm_max_retries: default_llm_max_retries(),
            llm_retry_delay_ms: default_llm_retry_delay_ms(),
            handoff_cap: default_handoff_cap(),
            default_agent: default_default_agent(),
            provider: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemorySettings {
    /// Idle time after which a thread is deleted by the sweeper.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// Retained message cap per thread; overflow triggers head-and-tail trim.
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,
}

fn default_ttl_secs() -> u64 {
    7200
}

fn default_sweep_interval_secs() -> u64 {
    600
}

fn default_max_messages() -> usize {
    50
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            max_messages: default_max_messages(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualitySettings {
    #[serde(default = "default_pass_threshold")]
    pub pass_threshold: f64,
}

fn default_pass_threshold() -> f64 {
    70.0
}

impl Default for QualitySettings {
    fn default() -> Self {
        Self {
            pass_threshold: default_pass_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SearchConfig {
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ToolsConfig {
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    #[serde(default)]
    pub agents: AgentSettings,
    #[serde(default)]
    pub memory: MemorySettings,
    #[serde(default)]
    pub quality: QualitySettings,
    #[serde(default)]
    pub tools: ToolsConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn load_or_default(paths: &Paths) -> Result<Self> {
        let config_path = paths.config_file();
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// First configured provider in priority order.
    pub fn get_api_key(&self) -> Option<(&str, &ProviderConfig)> {
        let priority = ["openrouter", "deepseek", "anthropic", "openai", "groq"];

        for name in priority {
            if let Some(provider) = self.providers.get(name) {
                if !provider.api_key.is_empty() {
                    return Some((name, provider));
                }
            }
        }
        None
    }

    pub fn get_provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.memory.ttl_secs, 7200);
        assert_eq!(cfg.memory.sweep_interval_secs, 600);
        assert_eq!(cfg.memory.max_messages, 50);
        assert_eq!(cfg.agents.handoff_cap, 1);
        assert_eq!(cfg.agents.default_agent, "general");
        assert_eq!(cfg.quality.pass_threshold, 70.0);
    }

    #[test]
    fn test_partial_config_parses() {
        let raw = r#"{
  "providers": { "openai": { "apiKey": "sk-test" } },
  "agents": { "handoffCap": 2 }
}"#;
        let cfg: Config = serde_json::from_str(raw).unwrap();
        assert_eq!(cfg.agents.handoff_cap, 2);
        assert_eq!(cfg.agents.llm_max_retries, 2);
        let (name, provider) = cfg.get_api_key().unwrap();
        assert_eq!(name, "openai");
        assert_eq!(provider.api_key, "sk-test");
    }

    #[test]
    fn test_provider_priority_order() {
        let raw = r#"{
  "providers": {
    "openai": { "apiKey": "sk-openai" },
    "openrouter": { "apiKey": "sk-or" }
  }
}"#;
        let cfg: Config = serde_json::from_str(raw).unwrap();
        let (name, _) = cfg.get_api_key().unwrap();
        assert_eq!(name, "openrouter");
    }
}
