use switchboard_capabilities::CapabilityRegistry;

pub fn run() -> anyhow::Result<()> {
    let registry = CapabilityRegistry::with_builtins();
    for name in registry.names() {
        if let Ok(capability) = registry.lookup(&name) {
            let schema = capability.schema();
            let summary = schema
                .description
                .split_once(". ")
                .map(|(first, _)| first)
                .unwrap_or(schema.description);
            println!("{:<14} {}", name, summary);
        }
    }
    Ok(())
}
