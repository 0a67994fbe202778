//! Project directory setup for `toolrunner init`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::info;

/// Options for `init_project`.
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// If true, wipe an existing project directory and start empty.
    pub force: bool,
}

/// Create the sandboxed project directory.
///
/// Fails if it already exists unless `options.force` is set. Returns the
/// canonical root.
pub fn init_project(root: &Path, options: &InitOptions) -> Result<PathBuf> {
    if root.exists() {
        if !options.force {
            return Err(anyhow!(
                "toolrunner init: {} already exists (use --force to recreate)",
                root.display()
            ));
        }
        if !root.is_dir() {
            return Err(anyhow!(
                "toolrunner init: {} exists but is not a directory",
                root.display()
            ));
        }
        let canonical = root
            .canonicalize()
            .with_context(|| format!("resolve {}", root.display()))?;
        if canonical.parent().is_none() {
            return Err(anyhow!(
                "toolrunner init: refusing to wipe {}",
                canonical.display()
            ));
        }
        fs::remove_dir_all(&canonical)
            .with_context(|| format!("remove {}", canonical.display()))?;
        info!(root = %canonical.display(), "removed existing project");
    }
    fs::create_dir_all(root).with_context(|| format!("create {}", root.display()))?;
    let canonical = root
        .canonicalize()
        .with_context(|| format!("resolve {}", root.display()))?;
    info!(root = %canonical.display(), "project ready");
    Ok(canonical)
}
