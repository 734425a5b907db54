pub mod capabilities;
pub mod chat;
pub mod config_cmd;
pub mod route;
pub mod score;

use std::path::PathBuf;
use switchboard_core::{Config, Paths};

pub(crate) fn load_config(override_path: Option<PathBuf>) -> anyhow::Result<Config> {
    match override_path {
        Some(path) => Ok(Config::load(&path)?),
        None => Ok(Config::load_or_default(&Paths::new())?),
    }
}
