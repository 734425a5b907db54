use anyhow::Context;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use switchboard_agent::{
    AgentId, Dispatcher, IntentClassifier, ModelFallback, ProfileTable, TierModels,
};
use switchboard_capabilities::CapabilityRegistry;
use switchboard_core::{DispatchReply, DispatchRequest, StageEvent};
use switchboard_memory::ThreadStore;
use switchboard_providers::create_model_client;
use tokio::sync::mpsc;

pub async fn run(
    message: Option<String>,
    thread: String,
    config_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;

    let standard = create_model_client(&config, &config.agents.model).context(
        "no provider configured; add an API key under providers in ~/.switchboard/config.json",
    )?;
    let fast = config
        .agents
        .fast_model
        .as_deref()
        .and_then(|model| create_model_client(&config, model));
    let advanced = config
        .agents
        .advanced_model
        .as_deref()
        .and_then(|model| create_model_client(&config, model));
    let fallback_model = fast.clone().unwrap_or_else(|| Arc::clone(&standard));
    let models = TierModels::new(standard, fast, advanced);

    let default_agent =
        AgentId::parse(&config.agents.default_agent).unwrap_or(AgentId::General);
    let classifier = IntentClassifier::new(default_agent)
        .with_fallback(Arc::new(ModelFallback::new(fallback_model)));

    let memory = Arc::new(ThreadStore::new(&config.memory));
    let _sweeper = Arc::clone(&memory).spawn_sweeper(std::time::Duration::from_secs(
        config.memory.sweep_interval_secs,
    ));

    let dispatcher = Dispatcher::new(
        ProfileTable::standard(default_agent),
        classifier,
        Arc::new(CapabilityRegistry::with_builtins()),
        Arc::clone(&memory),
        models,
        config,
    )?;

    if let Some(message) = message {
        let reply = send(&dispatcher, &thread, &message).await;
        println!("[{}] {}", reply.agent_id, reply.text);
        return Ok(());
    }

    println!("switchboard chat — 'exit' to quit, '/reset' to clear this thread");
    let stdin = io::stdin();
    loop {
        print!("you> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        match line {
            "" => continue,
            "exit" | "quit" => break,
            "/reset" => {
                memory.clear(&thread);
                println!("(thread cleared)");
                continue;
            }
            _ => {}
        }

        let reply = send(&dispatcher, &thread, line).await;
        println!("[{}] {}", reply.agent_id, reply.text);
        if !reply.capabilities_used.is_empty() {
            println!("    used: {}", reply.capabilities_used.join(", "));
        }
    }

    Ok(())
}

async fn send(dispatcher: &Dispatcher, thread: &str, text: &str) -> DispatchReply {
    let (tx, mut rx) = mpsc::channel(16);
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                StageEvent::Routing => eprintln!("  · routing"),
                StageEvent::Thinking { agent } => eprintln!("  · {} thinking", agent),
                StageEvent::ToolCall { name } => eprintln!("  · calling {}", name),
                StageEvent::Responding { agent } => eprintln!("  · {} responding", agent),
            }
        }
    });

    let request = DispatchRequest::new("cli-user", thread, "cli", text);
    let reply = dispatcher.dispatch(request, Some(tx)).await;
    let _ = printer.await;
    reply
}
