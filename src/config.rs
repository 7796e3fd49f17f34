use crate::types::*;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "cowale-kit";
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Directory installed into the destination project.
pub const AGENT_DIR: &str = ".agent";
/// Companion file seeded into the project root, relative to the installed tree.
pub const COMPANION_SOURCE: [&str; 2] = ["rules", "GEMINI.md"];
pub const COMPANION_FILE_NAME: &str = "GEMINI.md";
pub const STAGING_PREFIX: &str = ".agent-download-tmp";
pub const ARCHIVE_FILE_NAME: &str = "archive.tar.gz";
pub const MAX_REDIRECTS: usize = 10;

pub fn user_agent() -> String {
    format!("{}/{}", APP_NAME, env!("CARGO_PKG_VERSION"))
}

pub fn get_config_file_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("COWALE_KIT_CONFIG_PATH") {
        return Ok(PathBuf::from(path));
    }
    let path = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
        .join(APP_NAME)
        .join(CONFIG_FILE_NAME);
    tracing::debug!("Config file path: {}", path.display());
    Ok(path)
}

pub fn load_settings() -> Result<KitSettings> {
    let config_path = get_config_file_path()?;
    let settings = read_settings_file(&config_path)?;
    Ok(apply_env_overrides(settings, |key| std::env::var(key).ok()))
}

fn read_settings_file(config_path: &Path) -> Result<KitSettings> {
    if !config_path.exists() {
        return Ok(KitSettings::default());
    }

    let content = fs::read_to_string(config_path)
        .with_context(|| format!("Could not read config file at {}", config_path.display()))?;

    serde_json::from_str(&content).with_context(|| {
        format!(
            "Could not parse config file at {} as JSON",
            config_path.display()
        )
    })
}

/// Environment variables win over the config file. Empty values are ignored.
pub fn apply_env_overrides(
    mut settings: KitSettings,
    lookup: impl Fn(&str) -> Option<String>,
) -> KitSettings {
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(owner) = get("COWALE_KIT_OWNER") {
        settings.owner = owner;
    }
    if let Some(repo) = get("COWALE_KIT_REPO") {
        settings.repo = repo;
    }
    if let Some(branch) = get("COWALE_KIT_BRANCH") {
        settings.default_branch = branch;
    }
    if let Some(url) = get("COWALE_KIT_API_URL") {
        settings.api_base_url = url.trim_end_matches('/').to_string();
    }

    settings
}
