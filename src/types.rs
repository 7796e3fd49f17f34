use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KitSettings {
    #[serde(default = "default_owner")]
    pub owner: String,
    #[serde(default = "default_repo")]
    pub repo: String,
    #[serde(default = "default_branch")]
    pub default_branch: String,
    #[serde(default = "default_api_base_url", alias = "api_url")]
    pub api_base_url: String,
}

fn default_owner() -> String {
    "cowale".to_string()
}
fn default_repo() -> String {
    "cowaleAiKit".to_string()
}
fn default_branch() -> String {
    "main".to_string()
}
fn default_api_base_url() -> String {
    "https://api.github.com".to_string()
}

impl Default for KitSettings {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            repo: default_repo(),
            default_branch: default_branch(),
            api_base_url: default_api_base_url(),
        }
    }
}

impl KitSettings {
    /// "owner/repo", as shown to the user.
    pub fn full_repo(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

/// Counts of the recognized resources inside an installed `.agent/` tree.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ContentCounts {
    pub agents: usize,
    pub skills: usize,
    pub workflows: usize,
    pub total: usize,
}

/// Everything one pipeline run needs to know about where and what to install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRequest {
    pub dest: PathBuf,
    pub branch: String,
    pub overwrite: bool,
    pub show_progress: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    pub installed_path: PathBuf,
    pub companion_seeded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusReport {
    pub installed: bool,
    pub location: PathBuf,
    #[serde(default)]
    pub counts: Option<ContentCounts>,
    pub companion_present: bool,
}
