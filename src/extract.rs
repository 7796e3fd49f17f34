use crate::config::{ARCHIVE_FILE_NAME, STAGING_PREFIX};
use crate::download::save_response;
use crate::error::KitError;
use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::Response;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::process::Command;

/// Scratch directory for one pipeline run, created beneath the destination
/// root so the final rename never crosses filesystems.
///
/// Dropping it removes the directory and everything in it.
pub struct Staging {
    dir: TempDir,
}

impl Staging {
    pub fn create(dest: &Path) -> Result<Self> {
        let prefix = format!(
            "{}-{}-{}-",
            STAGING_PREFIX,
            std::process::id(),
            Utc::now().timestamp_millis()
        );
        fs::create_dir_all(dest)
            .with_context(|| format!("Could not create {}", dest.display()))?;
        let dir = tempfile::Builder::new()
            .prefix(&prefix)
            .tempdir_in(dest)
            .with_context(|| format!("Could not create staging directory in {}", dest.display()))?;
        tracing::debug!("Staging directory: {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn archive_path(&self) -> PathBuf {
        self.path().join(ARCHIVE_FILE_NAME)
    }

    /// Persist the payload; `tar` needs a file, not a live stream.
    pub async fn stage_archive(&self, response: Response, show_progress: bool) -> Result<PathBuf> {
        let archive = self.archive_path();
        save_response(response, &archive, show_progress).await?;
        Ok(archive)
    }

    /// Unpack the staged archive and return the directory it produced.
    pub async fn unpack(&self, tar: &Path) -> Result<PathBuf> {
        extract_archive(tar, &self.archive_path(), self.path()).await?;
        find_extracted_root(self.path())
    }

    /// Remove the staging directory. Failure is logged, never surfaced.
    pub fn close(self) {
        let path = self.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            tracing::warn!("Could not remove staging directory {}: {}", path.display(), e);
        }
    }
}

/// Locate the system `tar`.
pub fn find_tar() -> Result<PathBuf> {
    which::which("tar").map_err(|_| {
        KitError::MissingDependency {
            tool: "tar".to_string(),
        }
        .into()
    })
}

pub async fn extract_archive(tar: &Path, archive_path: &Path, extract_dir: &Path) -> Result<()> {
    tracing::info!(
        "Extracting {} into {}...",
        archive_path.display(),
        extract_dir.display()
    );

    let output = Command::new(tar)
        .arg("-xzf")
        .arg(archive_path)
        .arg("-C")
        .arg(extract_dir)
        .output()
        .await
        .with_context(|| format!("Failed to execute {}", tar.display()))?;

    if !output.status.success() {
        return Err(KitError::Extraction {
            tool: tar.display().to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
        .into());
    }

    Ok(())
}

/// The archive's single top-level directory. Its name embeds a commit hash,
/// so it is discovered rather than predicted. More than one candidate is an
/// error.
pub fn find_extracted_root(staging: &Path) -> Result<PathBuf> {
    let mut candidates = Vec::new();
    for entry in fs::read_dir(staging)
        .with_context(|| format!("Could not list {}", staging.display()))?
    {
        let entry = entry?;
        if entry.file_name() == ARCHIVE_FILE_NAME {
            continue;
        }
        let path = entry.path();
        if path.is_dir() {
            candidates.push(path);
        }
    }

    match candidates.len() {
        0 => Err(KitError::NoExtractedRoot.into()),
        1 => Ok(candidates.remove(0)),
        count => {
            candidates.sort();
            tracing::debug!("Extracted directories: {:?}", candidates);
            Err(KitError::AmbiguousExtractedRoot { count }.into())
        }
    }
}
