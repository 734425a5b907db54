use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use switchboard_capabilities::{CapabilityContext, CapabilityRegistry, ToolRecord};
use switchboard_core::types::{ChatMessage, ModelResponse, HANDOFF_TOOL};
use switchboard_core::{Config, DispatchReply, DispatchRequest, Result, StageEvent};
use switchboard_memory::{Role, ThreadStore};
use switchboard_providers::ModelClient;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::context::build_system_context;
use crate::intent::IntentClassifier;
use crate::profile::{AgentId, ModelTier, ProfileTable};

/// Model clients by tier. Fast and advanced fall back to standard when a
/// deployment only configures one model.
pub struct TierModels {
    standard: Arc<dyn ModelClient>,
    fast: Option<Arc<dyn ModelClient>>,
    advanced: Option<Arc<dyn ModelClient>>,
}

impl TierModels {
    pub fn new(
        standard: Arc<dyn ModelClient>,
        fast: Option<Arc<dyn ModelClient>>,
        advanced: Option<Arc<dyn ModelClient>>,
    ) -> Self {
        Self {
            standard,
            fast,
            advanced,
        }
    }

    pub fn single(model: Arc<dyn ModelClient>) -> Self {
        Self::new(model, None, None)
    }

    pub fn for_tier(&self, tier: ModelTier) -> &Arc<dyn ModelClient> {
        match tier {
            ModelTier::Fast => self.fast.as_ref().unwrap_or(&self.standard),
            ModelTier::Standard => &self.standard,
            ModelTier::Advanced => self.advanced.as_ref().unwrap_or(&self.standard),
        }
    }
}

/// Executes one agent turn: routing, the model/tool cycle, and the handoff
/// protocol. All collaborators are injected; the loop owns no global state.
pub struct Dispatcher {
    profiles: ProfileTable,
    classifier: IntentClassifier,
    registry: Arc<CapabilityRegistry>,
    memory: Arc<ThreadStore>,
    models: TierModels,
    config: Config,
}

impl Dispatcher {
    pub fn new(
        profiles: ProfileTable,
        classifier: IntentClassifier,
        registry: Arc<CapabilityRegistry>,
        memory: Arc<ThreadStore>,
        models: TierModels,
        config: Config,
    ) -> Result<Self> {
        profiles.validate(&registry)?;
        Ok(Self {
            profiles,
            classifier,
            registry,
            memory,
            models,
            config,
        })
    }

    /// Run one turn. Infallible to the caller: every failure mode inside the
    /// loop degrades to text, so a bad request can never poison the transport
    /// or a neighboring thread.
    pub async fn dispatch(
        &self,
        request: DispatchRequest,
        stage_tx: Option<mpsc::Sender<StageEvent>>,
    ) -> DispatchReply {
        let user_text = request.latest_user_text().to_string();
        info!(thread_id = %request.thread_id, channel_id = %request.channel_id, "Dispatching message");

        let snapshot =
            self.memory
                .get_or_create(&request.thread_id, &request.channel_id, &request.user_id);
        if snapshot.messages.is_empty() {
            // New thread: seed with everything the transport handed us so
            // platform-provided context survives into later turns.
            for message in &request.messages {
                let role = if message.role == "assistant" {
                    Role::Assistant
                } else {
                    Role::User
                };
                self.memory
                    .append_message(&request.thread_id, role, &message.text, None);
            }
        } else if !user_text.is_empty() {
            self.memory
                .append_message(&request.thread_id, Role::User, &user_text, None);
        }

        emit(&stage_tx, StageEvent::Routing).await;
        let mut forced_target: Option<AgentId> = None;
        let mut hops: u32 = 0;
        let mut pre_handoff_text: Option<String> = None;
        let mut capabilities_used: Vec<String> = Vec::new();

        loop {
            let agent = match forced_target.take() {
                Some(agent) => agent,
                None => self.classifier.classify(&user_text).await,
            };
            let profile = self.profiles.get(agent);
            debug!(agent = %agent, tier = ?profile.tier, "Agent selected");

            emit(
                &stage_tx,
                StageEvent::Thinking {
                    agent: agent.to_string(),
                },
            )
            .await;

            // Scratch may have changed since the initial snapshot (handoff
            // payloads land there), so re-read before building context.
            let thread = match self.memory.snapshot(&request.thread_id) {
                Some(thread) => thread,
                None => {
                    // Swept mid-turn; recreate and continue with what we have
                    self.memory.get_or_create(
                        &request.thread_id,
                        &request.channel_id,
                        &request.user_id,
                    )
                }
            };

            let system = build_system_context(profile, &thread);
            let mut messages = vec![ChatMessage::system(&system)];
            for msg in &thread.messages {
                messages.push(match msg.role {
                    Role::User => ChatMessage::user(&msg.text),
                    Role::Assistant => ChatMessage::assistant(&msg.text),
                });
            }

            let mut tools = self.registry.schemas_for(profile.capabilities);
            tools.push(handoff_schema());

            let model = self.models.for_tier(profile.tier);
            let response = match self.call_with_retry(model, &messages, &tools).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(agent = %agent, error = %e, "Model call failed at loop boundary");
                    return self
                        .finish(&request, agent, profile.apology(), capabilities_used)
                        .await;
                }
            };

            // ── Handoff protocol ──
            if let Some(handoff) = response.handoff {
                if hops < self.config.agents.handoff_cap {
                    hops += 1;
                    let next = AgentId::parse(&handoff.target)
                        .unwrap_or_else(|| self.profiles.default_agent());
                    info!(from = %agent, to = %next, reason = %handoff.reason, "Agent handoff");
                    if !handoff.context.is_empty() {
                        self.memory.merge_scratch(
                            &request.thread_id,
                            next.as_str(),
                            handoff.context,
                        );
                    }
                    if pre_handoff_text.is_none() {
                        pre_handoff_text = response.text.filter(|t| !t.is_empty());
                    }
                    forced_target = Some(next);
                    emit(&stage_tx, StageEvent::Routing).await;
                    continue;
                }

                warn!(agent = %agent, target = %handoff.target, cap = self.config.agents.handoff_cap,
                    "Handoff cap exceeded, returning pre-handoff response");
                let text = pre_handoff_text
                    .or_else(|| response.text.filter(|t| !t.is_empty()))
                    .unwrap_or_else(|| profile.apology());
                return self
                    .finish(&request, agent, text, capabilities_used)
                    .await;
            }

            // ── Single batch tool round ──
            if !response.tool_calls.is_empty() {
                let assistant_msg = ChatMessage::assistant_with_calls(
                    response.text.as_deref().unwrap_or(""),
                    response.tool_calls.clone(),
                );

                let ctx = CapabilityContext::new(
                    &request.thread_id,
                    &request.channel_id,
                    &request.user_id,
                    self.config.clone(),
                );

                let mut records: Vec<ToolRecord> = Vec::new();
                for call in &response.tool_calls {
                    emit(
                        &stage_tx,
                        StageEvent::ToolCall {
                            name: call.name.clone(),
                        },
                    )
                    .await;
                    let outcome = self
                        .registry
                        .invoke(&call.name, ctx.clone(), call.arguments.clone())
                        .await;
                    if !capabilities_used.contains(&call.name) {
                        capabilities_used.push(call.name.clone());
                    }
                    records.push(ToolRecord {
                        call: call.clone(),
                        outcome,
                    });
                }

                emit(
                    &stage_tx,
                    StageEvent::Responding {
                        agent: agent.to_string(),
                    },
                )
                .await;

                // Follow-up completion with the original request, the model's
                // proposal, and every result. No tool schemas here: one batch
                // round per turn, further tool use waits for the next turn.
                let mut followup = messages;
                followup.push(assistant_msg);
                for record in &records {
                    followup.push(ChatMessage::tool_result(
                        &record.call.id,
                        &record.call.name,
                        &record.outcome.payload().to_string(),
                    ));
                }

                let text = match self.call_with_retry(model, &followup, &[]).await {
                    Ok(final_response) => final_response
                        .text
                        .filter(|t| !t.is_empty())
                        .unwrap_or_else(|| profile.apology()),
                    Err(e) => {
                        warn!(agent = %agent, error = %e, "Follow-up completion failed");
                        profile.apology()
                    }
                };
                return self
                    .finish(&request, agent, text, capabilities_used)
                    .await;
            }

            // ── No tool calls: the text is final ──
            emit(
                &stage_tx,
                StageEvent::Responding {
                    agent: agent.to_string(),
                },
            )
            .await;
            let text = response
                .text
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| profile.apology());
            return self
                .finish(&request, agent, text, capabilities_used)
                .await;
        }
    }

    async fn finish(
        &self,
        request: &DispatchRequest,
        agent: AgentId,
        text: String,
        capabilities_used: Vec<String>,
    ) -> DispatchReply {
        self.memory
            .append_message(&request.thread_id, Role::Assistant, &text, Some(agent.as_str()));
        self.memory
            .set_current_agent(&request.thread_id, agent.as_str());
        info!(agent = %agent, capabilities = ?capabilities_used, "Turn complete");
        DispatchReply {
            text,
            agent_id: agent.to_string(),
            capabilities_used,
        }
    }

    /// Call the model, retrying transient failures with exponential backoff
    /// before conceding.
    async fn call_with_retry(
        &self,
        model: &Arc<dyn ModelClient>,
        messages: &[ChatMessage],
        tools: &[Value],
    ) -> Result<ModelResponse> {
        let max_retries = self.config.agents.llm_max_retries;
        let base_delay_ms = self.config.agents.llm_retry_delay_ms;
        let mut last_error = None;

        for attempt in 0..=max_retries {
            if attempt > 0 {
                let delay_ms = base_delay_ms * (1u64 << (attempt - 1).min(4));
                warn!(attempt, max_retries, delay_ms, "Retrying model call after transient error");
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
            match model.complete(messages, tools).await {
                Ok(response) => {
                    if attempt > 0 {
                        info!(attempt, "Model call succeeded after retry");
                    }
                    return Ok(response);
                }
                Err(e) => {
                    warn!(error = %e, attempt, max_retries, "Model call failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            switchboard_core::Error::Provider("model call failed with no attempts".to_string())
        }))
    }
}

/// Schema for the reserved handoff tool, appended to every agent's tool list.
fn handoff_schema() -> Value {
    let targets: Vec<&str> = AgentId::ALL.iter().map(|a| a.as_str()).collect();
    json!({
        "type": "function",
        "function": {
            "name": HANDOFF_TOOL,
            "description": "Redirect the rest of this turn to a different agent. Use only when the request clearly belongs to a teammate.",
            "parameters": {
                "type": "object",
                "properties": {
                    "target": {
                        "type": "string",
                        "enum": targets,
                        "description": "Agent to take over"
                    },
                    "reason": {
                        "type": "string",
                        "description": "One line on why"
                    },
                    "context": {
                        "type": "object",
                        "description": "Notes carried into the target agent's scratch data"
                    }
                },
                "required": ["target"]
            }
        }
    })
}

async fn emit(tx: &Option<mpsc::Sender<StageEvent>>, event: StageEvent) {
    if let Some(tx) = tx {
        let _ = tx.send(event).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handoff_schema_shape() {
        let schema = handoff_schema();
        assert_eq!(schema["function"]["name"], HANDOFF_TOOL);
        let targets = schema["function"]["parameters"]["properties"]["target"]["enum"]
            .as_array()
            .unwrap();
        assert_eq!(targets.len(), AgentId::ALL.len());
    }
}
