use async_trait::async_trait;
use regex::Regex;
use std::sync::Arc;
use switchboard_core::types::ChatMessage;
use switchboard_core::Result;
use switchboard_providers::ModelClient;
use tracing::{debug, info, warn};

use crate::profile::AgentId;

/// One routing rule: an agent plus the trigger terms and patterns that select
/// it. First matching rule wins, in declaration order.
struct RouteRule {
    agent: AgentId,
    keywords: Vec<&'static str>,
    patterns: Vec<Regex>,
}

impl RouteRule {
    fn matches(&self, text: &str, text_lower: &str) -> bool {
        for pattern in &self.patterns {
            if pattern.is_match(text) {
                return true;
            }
        }
        for keyword in &self.keywords {
            if text_lower.contains(keyword) {
                return true;
            }
        }
        false
    }
}

/// Pluggable classifier consulted only when no rule matches. Must return one
/// of the known agent identifiers; anything else falls back to the default
/// agent.
#[async_trait]
pub trait IntentFallback: Send + Sync {
    async fn classify(&self, text: &str) -> Result<String>;
}

/// Fallback backed by a single small model call.
pub struct ModelFallback {
    model: Arc<dyn ModelClient>,
}

impl ModelFallback {
    pub fn new(model: Arc<dyn ModelClient>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl IntentFallback for ModelFallback {
    async fn classify(&self, text: &str) -> Result<String> {
        let agent_list = AgentId::ALL
            .iter()
            .map(|a| a.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let system = format!(
            "You route chat messages to one of these agents: {}. \
             Reply with exactly one agent identifier and nothing else.",
            agent_list
        );
        let messages = [ChatMessage::system(&system), ChatMessage::user(text)];
        let response = self.model.complete(&messages, &[]).await?;
        let reply = response.text.unwrap_or_default();
        Ok(reply
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase())
    }
}

/// Maps the latest user utterance to an agent. Pure with respect to
/// conversation state: rules see one utterance, never history.
pub struct IntentClassifier {
    rules: Vec<RouteRule>,
    fallback: Option<Arc<dyn IntentFallback>>,
    default_agent: AgentId,
}

impl IntentClassifier {
    pub fn new(default_agent: AgentId) -> Self {
        let rules = vec![
            // Greetings and pleasantries stay with the concierge; without
            // this rule every "hello" would burn a fallback call.
            RouteRule {
                agent: AgentId::General,
                keywords: vec![],
                patterns: vec![
                    Regex::new(r"(?i)^(hi|hello|hey|howdy|good\s*(morning|afternoon|evening))[\s!.,?]*$").unwrap(),
                    Regex::new(r"(?i)^(thanks|thank\s*you|cheers|got\s*it|ok|okay)[\s!.,?]*$").unwrap(),
                    Regex::new(r"(?i)^(bye|goodbye|see\s*you|good\s*night)[\s!.,?]*$").unwrap(),
                    Regex::new(r"(?i)^(who\s*are\s*you|what\s*can\s*you\s*do|help)[\s!.,?]*$").unwrap(),
                ],
            },
            RouteRule {
                agent: AgentId::Research,
                keywords: vec![
                    "search",
                    "look up",
                    "look into",
                    "research",
                    "find out",
                    "latest news",
                    "what's happening",
                    "headline",
                    "dig up",
                    "fact-check",
                    "fact check",
                ],
                patterns: vec![Regex::new(r"https?://").unwrap()],
            },
            RouteRule {
                agent: AgentId::Writer,
                keywords: vec![
                    "draft",
                    "write up",
                    "write a report",
                    "rewrite",
                    "review this",
                    "review my",
                    "score this",
                    "polish",
                    "proofread",
                    "edit this",
                    "quality check",
                ],
                patterns: vec![],
            },
        ];

        Self {
            rules,
            fallback: None,
            default_agent,
        }
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn IntentFallback>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Rule fast path only; `None` when no rule matches.
    pub fn match_rules(&self, text: &str) -> Option<AgentId> {
        let text_lower = text.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(text, &text_lower))
            .map(|rule| rule.agent)
    }

    /// Full classification: rules, then the pluggable fallback, then the
    /// default agent. A rule match short-circuits the fallback entirely.
    pub async fn classify(&self, text: &str) -> AgentId {
        if let Some(agent) = self.match_rules(text) {
            debug!(agent = %agent, "Intent matched by rule");
            return agent;
        }

        if let Some(fallback) = &self.fallback {
            match fallback.classify(text).await {
                Ok(id) => match AgentId::parse(&id) {
                    Some(agent) => {
                        info!(agent = %agent, "Intent resolved by fallback classifier");
                        return agent;
                    }
                    None => {
                        warn!(returned = %id, "Fallback classifier returned unknown agent, using default");
                    }
                },
                Err(e) => {
                    warn!(error = %e, "Fallback classifier failed, using default");
                }
            }
        }

        self.default_agent
    }
}
