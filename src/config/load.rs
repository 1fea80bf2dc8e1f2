use std::path::Path;

use anyhow::{bail, Context};

use super::types::AppConfig;
use crate::router::RoutePattern;

/// Serialization format of a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

impl ConfigFormat {
    /// Pick the format from the file extension; anything unrecognised is treated as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("yaml") | Some("yml") => ConfigFormat::Yaml,
            Some("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Json,
        }
    }
}

/// Load and validate an application configuration file.
pub fn load_config(file_path: impl AsRef<Path>) -> anyhow::Result<AppConfig> {
    let path = file_path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    parse_config(&content, ConfigFormat::from_path(path))
        .with_context(|| format!("invalid config {}", path.display()))
}

/// Parse and validate configuration text in the given format.
pub fn parse_config(content: &str, format: ConfigFormat) -> anyhow::Result<AppConfig> {
    let config: AppConfig = match format {
        ConfigFormat::Yaml => serde_yaml::from_str(content)?,
        ConfigFormat::Json => serde_json::from_str(content)?,
        ConfigFormat::Toml => toml::from_str(content)?,
    };
    validate(&config)?;
    Ok(config)
}

fn validate(config: &AppConfig) -> anyhow::Result<()> {
    for (method, entries) in config.routes.buckets() {
        for entry in entries {
            if !entry.pattern.starts_with('/') {
                bail!("route `{method} {}` must start with `/`", entry.pattern);
            }
            if entry.controller.is_empty() || entry.action.is_empty() {
                bail!(
                    "route `{method} {}` needs both a controller and an action",
                    entry.pattern
                );
            }
            RoutePattern::compile(&entry.pattern)
                .with_context(|| format!("route `{method} {}`", entry.pattern))?;
        }
    }
    for (role, handler) in [
        ("not_found", &config.not_found),
        ("server_error", &config.server_error),
    ] {
        if handler.controller.is_empty() || handler.action.is_empty() {
            bail!("`{role}` must name a controller and an action");
        }
    }
    Ok(())
}
