use std::path::PathBuf;
use switchboard_agent::{AgentId, IntentClassifier};

pub fn run(text: &str, config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let default_agent =
        AgentId::parse(&config.agents.default_agent).unwrap_or(AgentId::General);
    let classifier = IntentClassifier::new(default_agent);

    match classifier.match_rules(text) {
        Some(agent) => println!("{}  (rule match)", agent),
        None => println!(
            "{}  (no rule match; the fallback classifier decides at dispatch time)",
            default_agent
        ),
    }
    Ok(())
}
