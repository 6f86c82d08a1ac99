use anyhow::{Context, Result};
use std::path::Path;
use termloop_types::ConsoleConfig;

/// Load the console config from an optional TOML file. A missing path means
/// defaults; a present but unreadable or invalid file is an error.
pub fn load(path: Option<&Path>) -> Result<ConsoleConfig> {
    let Some(path) = path else {
        return Ok(ConsoleConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("Invalid config file {}", path.display()))
}
