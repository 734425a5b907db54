use std::path::PathBuf;
use switchboard_core::Paths;

pub fn show(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let mut config = super::load_config(config_path)?;
    for provider in config.providers.values_mut() {
        if !provider.api_key.is_empty() {
            provider.api_key = "***".to_string();
        }
    }
    if !config.tools.search.api_key.is_empty() {
        config.tools.search.api_key = "***".to_string();
    }
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

pub fn path() -> anyhow::Result<()> {
    println!("{}", Paths::new().config_file().display());
    Ok(())
}
