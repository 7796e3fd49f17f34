use crate::config::{AGENT_DIR, COMPANION_FILE_NAME, COMPANION_SOURCE};
use crate::download::{build_client, fetch};
use crate::error::KitError;
use crate::extract::Staging;
use crate::github::build_tarball_url;
use crate::types::*;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub fn installed_tree_path(dest: &Path) -> PathBuf {
    dest.join(AGENT_DIR)
}

pub fn companion_path(dest: &Path) -> PathBuf {
    dest.join(COMPANION_FILE_NAME)
}

/// Refuse to touch an existing installation unless asked to.
///
/// A non-directory at the tree path is never replaced, even with `overwrite`.
pub fn check_preflight(dest: &Path, overwrite: bool) -> Result<()> {
    let target = installed_tree_path(dest);
    if target.symlink_metadata().is_ok() && !target.is_dir() {
        return Err(KitError::NotADirectory { path: target }.into());
    }
    if target.is_dir() && !overwrite {
        return Err(KitError::AlreadyInstalled {
            path: dest.to_path_buf(),
        }
        .into());
    }
    Ok(())
}

/// Download the kit tarball and install its `.agent/` tree into `request.dest`.
///
/// Staging lives beneath the destination and is removed on every path out of
/// this function: explicitly on success, by drop on failure.
pub async fn run_pipeline(
    settings: &KitSettings,
    request: &InstallRequest,
    tar: &Path,
) -> Result<InstallOutcome> {
    check_preflight(&request.dest, request.overwrite)?;

    let client = build_client()?;
    let url = build_tarball_url(settings, &request.branch)?;
    tracing::info!(
        "Downloading {} (branch: {}) from {}",
        settings.full_repo(),
        request.branch,
        url
    );
    let response = fetch(&client, url.as_str()).await?;

    let staging = Staging::create(&request.dest)?;
    staging
        .stage_archive(response, request.show_progress)
        .await?;
    let extracted_root = staging.unpack(tar).await?;
    tracing::debug!("Extracted root: {}", extracted_root.display());

    let installed_path = install_tree(
        &extracted_root,
        &request.dest,
        staging.path(),
        request.overwrite,
    )
    .await?;
    let companion_seeded = seed_companion(&request.dest)?;

    staging.close();

    tracing::info!("Installed {} to {}", AGENT_DIR, installed_path.display());
    Ok(InstallOutcome {
        installed_path,
        companion_seeded,
    })
}

/// Copy `<extracted_root>/.agent` into staging, then rename it into place.
///
/// An existing tree is moved aside into staging first and restored if the
/// final rename fails, so the destination is never left without a tree.
pub async fn install_tree(
    extracted_root: &Path,
    dest: &Path,
    staging: &Path,
    overwrite: bool,
) -> Result<PathBuf> {
    let source = extracted_root.join(AGENT_DIR);
    if !source.is_dir() {
        return Err(KitError::SourceDirMissing.into());
    }

    let fresh = staging.join("install");
    let copied = {
        let (source, fresh) = (source.clone(), fresh.clone());
        tokio::task::spawn_blocking(move || copy_dir_all(&source, &fresh))
            .await
            .context("Copy task panicked")??
    };
    tracing::debug!("Copied {} file(s) from {}", copied, source.display());

    let target = installed_tree_path(dest);
    swap_into_place(&fresh, &target, &staging.join("previous"), overwrite, dest)?;
    Ok(target)
}

fn swap_into_place(
    fresh: &Path,
    target: &Path,
    backup: &Path,
    overwrite: bool,
    dest: &Path,
) -> Result<()> {
    if !target.exists() {
        fs::rename(fresh, target)
            .with_context(|| format!("Could not move new tree to {}", target.display()))?;
        return Ok(());
    }

    if !overwrite {
        return Err(KitError::AlreadyInstalled {
            path: dest.to_path_buf(),
        }
        .into());
    }

    tracing::info!("Replacing existing {}", target.display());
    fs::rename(target, backup)
        .with_context(|| format!("Could not move aside {}", target.display()))?;

    if let Err(e) = fs::rename(fresh, target) {
        if let Err(restore) = fs::rename(backup, target) {
            tracing::warn!(
                "Could not restore previous tree to {}: {}",
                target.display(),
                restore
            );
        }
        return Err(e).with_context(|| format!("Could not move new tree to {}", target.display()));
    }

    Ok(())
}

/// Recursively copy `src` into `dst`, returning the number of files copied.
///
/// Files at matching relative paths are overwritten; files present only in
/// `dst` are left alone.
pub fn copy_dir_all(src: &Path, dst: &Path) -> Result<u64> {
    fs::create_dir_all(dst).with_context(|| format!("Could not create {}", dst.display()))?;

    let mut copied = 0u64;
    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry?;
        let relative = entry.path().strip_prefix(src)?;
        let target = dst.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target).with_context(|| {
                format!(
                    "Could not copy {} to {}",
                    entry.path().display(),
                    target.display()
                )
            })?;
            copied += 1;
        }
    }

    Ok(copied)
}

#[cfg(unix)]
fn copy_symlink(src: &Path, target: &Path) -> Result<()> {
    let link = fs::read_link(src)?;
    if target.symlink_metadata().is_ok() {
        fs::remove_file(target)?;
    }
    std::os::unix::fs::symlink(&link, target)
        .with_context(|| format!("Could not link {} -> {}", target.display(), link.display()))?;
    Ok(())
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, target: &Path) -> Result<()> {
    fs::copy(src, target)?;
    Ok(())
}

/// Copy `.agent/rules/GEMINI.md` to the project root, once.
///
/// Returns whether the file was written. An existing root copy always wins.
pub fn seed_companion(dest: &Path) -> Result<bool> {
    let source = COMPANION_SOURCE
        .iter()
        .fold(installed_tree_path(dest), |path, part| path.join(part));
    let target = companion_path(dest);

    if !source.is_file() {
        tracing::debug!("No companion file at {}", source.display());
        return Ok(false);
    }
    if target.exists() {
        tracing::debug!("Keeping existing {}", target.display());
        return Ok(false);
    }

    fs::copy(&source, &target)
        .with_context(|| format!("Could not copy {} to project root", COMPANION_FILE_NAME))?;
    tracing::info!("Seeded {}", target.display());
    Ok(true)
}
