//! GitHub URL construction
//!
//! The kit is distributed as a directory inside a GitHub repository, so the
//! only endpoint involved is the tarball download for a branch or ref.

use crate::types::KitSettings;
use anyhow::{anyhow, Context, Result};
use reqwest::Url;

/// Build the GitHub API URL that serves a gzip tarball of `branch`
///
/// # Arguments
/// * `settings` - Source repository and API base URL
/// * `branch` - Branch, tag or commit to download
///
/// Each path segment is percent-encoded, so `#` or `%` in a ref name stay part
/// of the ref. Slashes separate segments (`release/v1`).
pub fn build_tarball_url(settings: &KitSettings, branch: &str) -> Result<Url> {
    let mut url = Url::parse(&settings.api_base_url)
        .with_context(|| format!("Invalid API base URL: {}", settings.api_base_url))?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("API base URL cannot carry a path: {}", settings.api_base_url))?
        .pop_if_empty()
        .extend([
            "repos",
            settings.owner.as_str(),
            settings.repo.as_str(),
            "tarball",
        ])
        .extend(branch.split('/'));
    Ok(url)
}

/// Human-facing repository URL, used in remediation hints.
pub fn build_repo_url(settings: &KitSettings) -> String {
    format!("https://github.com/{}/{}", settings.owner, settings.repo)
}
