use serde::{Deserialize, Serialize};
use switchboard_capabilities::CapabilityRegistry;
use switchboard_core::{Error, Result};

/// Closed set of agents. Routing, handoff targets and scratch keys all go
/// through this enum so the compiler enforces exhaustive handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentId {
    General,
    Research,
    Writer,
}

impl AgentId {
    pub const ALL: [AgentId; 3] = [AgentId::General, AgentId::Research, AgentId::Writer];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentId::General => "general",
            AgentId::Research => "research",
            AgentId::Writer => "writer",
        }
    }

    pub fn parse(s: &str) -> Option<AgentId> {
        match s.trim().to_lowercase().as_str() {
            "general" => Some(AgentId::General),
            "research" => Some(AgentId::Research),
            "writer" => Some(AgentId::Writer),
            _ => None,
        }
    }

    fn index(&self) -> usize {
        match self {
            AgentId::General => 0,
            AgentId::Research => 1,
            AgentId::Writer => 2,
        }
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cost/latency class an agent runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    Fast,
    Standard,
    Advanced,
}

pub struct AgentProfile {
    pub id: AgentId,
    pub display_name: &'static str,
    /// Capability names this agent may invoke. Validated against the
    /// registry at startup.
    pub capabilities: &'static [&'static str],
    pub tier: ModelTier,
    pub system_prompt: &'static str,
}

impl AgentProfile {
    /// Generic error text in this agent's voice, used when a model call fails
    /// at the loop boundary.
    pub fn apology(&self) -> String {
        match self.id {
            AgentId::General => {
                "Sorry — I hit a snag handling that. Mind trying again in a moment?".to_string()
            }
            AgentId::Research => {
                "I ran into a problem while digging into that. Give me another go in a bit."
                    .to_string()
            }
            AgentId::Writer => {
                "I couldn't finish drafting that just now. Please send it my way again shortly."
                    .to_string()
            }
        }
    }
}

const GENERAL_PROMPT: &str = "You are the concierge of a small team of assistants. \
Answer everyday questions directly and keep replies short and warm. \
If the user needs live information from the web, hand off to the research agent; \
if they want a document drafted or reviewed, hand off to the writer.";

const RESEARCH_PROMPT: &str = "You are the research agent. You answer questions by \
searching the web and reading sources, and you always say where a claim comes from. \
Prefer fresh sources for anything time-sensitive. Keep the summary tight; link the rest.";

const WRITER_PROMPT: &str = "You are the writing agent. You draft and polish reports. \
House style: front-matter header (title, date, topic), a summary table, a references \
section, concrete figures over vague claims, American spellings. Run review_draft on \
anything longer than a few paragraphs before replying, and fix what it flags.";

/// The static agent table, fixed at process start.
pub struct ProfileTable {
    profiles: [AgentProfile; 3],
    default_agent: AgentId,
}

impl ProfileTable {
    pub fn standard(default_agent: AgentId) -> Self {
        Self {
            profiles: [
                AgentProfile {
                    id: AgentId::General,
                    display_name: "Concierge",
                    capabilities: &["current_time"],
                    tier: ModelTier::Fast,
                    system_prompt: GENERAL_PROMPT,
                },
                AgentProfile {
                    id: AgentId::Research,
                    display_name: "Research Desk",
                    capabilities: &["web_search", "web_fetch", "current_time"],
                    tier: ModelTier::Standard,
                    system_prompt: RESEARCH_PROMPT,
                },
                AgentProfile {
                    id: AgentId::Writer,
                    display_name: "Staff Writer",
                    capabilities: &["review_draft", "web_fetch"],
                    tier: ModelTier::Advanced,
                    system_prompt: WRITER_PROMPT,
                },
            ],
            default_agent,
        }
    }

    pub fn get(&self, id: AgentId) -> &AgentProfile {
        &self.profiles[id.index()]
    }

    pub fn default_agent(&self) -> AgentId {
        self.default_agent
    }

    pub fn iter(&self) -> impl Iterator<Item = &AgentProfile> {
        self.profiles.iter()
    }

    /// Fail fast when an allowlist names a capability the registry does not
    /// have.
    pub fn validate(&self, registry: &CapabilityRegistry) -> Result<()> {
        for profile in &self.profiles {
            for name in profile.capabilities {
                if registry.lookup(name).is_err() {
                    return Err(Error::Config(format!(
                        "agent '{}' allows unknown capability '{}'",
                        profile.id, name
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Default for ProfileTable {
    fn default() -> Self {
        Self::standard(AgentId::General)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_id_roundtrip() {
        for id in AgentId::ALL {
            assert_eq!(AgentId::parse(id.as_str()), Some(id));
        }
        assert_eq!(AgentId::parse(" Research "), Some(AgentId::Research));
        assert_eq!(AgentId::parse("unknown"), None);
    }

    #[test]
    fn test_standard_table_validates_against_builtins() {
        let registry = CapabilityRegistry::with_builtins();
        let table = ProfileTable::default();
        table.validate(&registry).unwrap();
    }

    #[test]
    fn test_validate_rejects_unknown_capability() {
        let registry = CapabilityRegistry::new();
        let table = ProfileTable::default();
        assert!(table.validate(&registry).is_err());
    }

    #[test]
    fn test_profiles_cover_all_agents() {
        let table = ProfileTable::default();
        for id in AgentId::ALL {
            assert_eq!(table.get(id).id, id);
        }
    }
}
