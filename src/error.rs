//! Failure conditions of the install pipeline and the dispatcher.
//!
//! Functions return `anyhow::Result`; these variants travel inside it and are
//! downcast at the command boundary to pick the message and remediation hints.

use crate::config::AGENT_DIR;
use crate::types::KitSettings;
use reqwest::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KitError {
    #[error("HTTP {status} from {url}")]
    HttpStatus { status: StatusCode, url: String },

    #[error("Too many redirects (more than {limit}) while fetching {url}")]
    TooManyRedirects { url: String, limit: usize },

    /// reqwest's message already names the URL.
    #[error("Request failed: {source}")]
    Network {
        #[source]
        source: reqwest::Error,
    },

    #[error("`{tool}` was not found on PATH")]
    MissingDependency { tool: String },

    #[error("`{tool}` exited with {status}: {stderr}")]
    Extraction {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("Could not find extracted directory in tarball")]
    NoExtractedRoot,

    #[error("Tarball unpacked into {count} top-level directories, expected exactly one")]
    AmbiguousExtractedRoot { count: usize },

    #[error("{}/ folder not found in repository", AGENT_DIR)]
    SourceDirMissing,

    #[error("{}/ already exists at {}", AGENT_DIR, .path.display())]
    AlreadyInstalled { path: PathBuf },

    #[error("No {}/ folder found at {}", AGENT_DIR, .path.display())]
    NotInstalled { path: PathBuf },

    #[error("{} exists but is not a directory", .path.display())]
    NotADirectory { path: PathBuf },
}

impl KitError {
    /// Failures raised while fetching, extracting or installing.
    pub fn is_pipeline_failure(&self) -> bool {
        matches!(
            self,
            KitError::HttpStatus { .. }
                | KitError::TooManyRedirects { .. }
                | KitError::Network { .. }
                | KitError::Extraction { .. }
                | KitError::NoExtractedRoot
                | KitError::AmbiguousExtractedRoot { .. }
                | KitError::SourceDirMissing
        )
    }

    pub fn hints(&self, settings: &KitSettings) -> Vec<String> {
        match self {
            KitError::AlreadyInstalled { .. } => {
                vec!["Use --force to overwrite existing installation".to_string()]
            }
            KitError::NotInstalled { .. } => {
                vec![format!("Run '{} init' first", crate::config::APP_NAME)]
            }
            KitError::NotADirectory { path } => vec![format!(
                "Move or remove {}, then run again",
                path.display()
            )],
            KitError::MissingDependency { tool } => vec![format!(
                "Install `{}` and make sure it is on your PATH",
                tool
            )],
            KitError::Extraction { .. } => vec![
                "The downloaded archive could not be unpacked".to_string(),
                format!("URL: {}", crate::github::build_repo_url(settings)),
            ],
            _ => vec![
                "Make sure the repository exists and is public".to_string(),
                format!("URL: {}", crate::github::build_repo_url(settings)),
            ],
        }
    }
}
