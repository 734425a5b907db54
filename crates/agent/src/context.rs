use switchboard_memory::ConversationThread;

use crate::profile::{AgentId, AgentProfile};

/// Assemble the system context for one agent turn: persona, handoff
/// instructions, and any scratch notes previous turns (or a handoff payload)
/// left for this agent.
pub fn build_system_context(profile: &AgentProfile, thread: &ConversationThread) -> String {
    let mut context = String::new();
    context.push_str(profile.system_prompt);

    let targets: Vec<&str> = AgentId::ALL
        .iter()
        .filter(|id| **id != profile.id)
        .map(|id| id.as_str())
        .collect();
    context.push_str(&format!(
        "\n\nTo redirect the rest of this turn to a teammate, call the `handoff` tool \
         with a `target` of {} and a short `reason`. Put anything the teammate needs \
         to know in `context`. Do not hand off for work you can do yourself.",
        targets.join(" or ")
    ));

    if let Some(bag) = thread.scratch.get(profile.id.as_str()) {
        if !bag.is_empty() {
            let notes = serde_json::to_string_pretty(bag).unwrap_or_default();
            context.push_str("\n\n## Working notes for this thread\n");
            context.push_str(&notes);
        }
    }

    context
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ProfileTable;
    use chrono::Utc;
    use serde_json::Map;

    #[test]
    fn test_context_names_other_agents_only() {
        let table = ProfileTable::default();
        let thread = ConversationThread::new("t", "c", "u", Utc::now());
        let context = build_system_context(table.get(AgentId::Research), &thread);
        assert!(context.contains("general or writer"));
        assert!(context.contains("handoff"));
    }

    #[test]
    fn test_context_includes_scratch_notes() {
        let table = ProfileTable::default();
        let mut thread = ConversationThread::new("t", "c", "u", Utc::now());
        let mut payload = Map::new();
        payload.insert("topic".to_string(), "eth staking".into());
        thread.merge_scratch("research", payload);

        let context = build_system_context(table.get(AgentId::Research), &thread);
        assert!(context.contains("Working notes"));
        assert!(context.contains("eth staking"));

        let other = build_system_context(table.get(AgentId::Writer), &thread);
        assert!(!other.contains("eth staking"));
    }
}
