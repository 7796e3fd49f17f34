use crate::types::ContentCounts;
use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

const DOC_SUFFIX: &str = ".md";

/// Count agents, skills and workflows in an installed `.agent/` tree.
///
/// A missing category directory counts as zero.
pub fn count_contents(tree: &Path) -> Result<ContentCounts> {
    let agents = count_entries(&tree.join("agents"), |name, _| {
        name.ends_with(DOC_SUFFIX) && !name.starts_with('.')
    })?;
    let skills = count_entries(&tree.join("skills"), |_, path| path.is_dir())?;
    let workflows = count_entries(&tree.join("workflows"), |name, _| name.ends_with(DOC_SUFFIX))?;

    Ok(ContentCounts {
        agents,
        skills,
        workflows,
        total: agents + skills + workflows,
    })
}

fn count_entries(dir: &Path, keep: impl Fn(&str, &Path) -> bool) -> Result<usize> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e).with_context(|| format!("Could not list {}", dir.display())),
    };

    let mut count = 0;
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let path = entry.path();
        if keep(name.to_string_lossy().as_ref(), path.as_path()) {
            count += 1;
        }
    }
    Ok(count)
}
