//! File access tools confined to the sandbox.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, info};

use crate::error::{ToolError, ToolResult};
use crate::io::sandbox::Sandbox;

/// Read a file inside the project.
pub fn read_file(sandbox: &Sandbox, requested: &Path) -> ToolResult<String> {
    let path = sandbox.resolve_existing(requested)?;
    debug!(path = %path.display(), "reading file");
    let bytes = fs::read(&path)
        .with_context(|| format!("read {}", sandbox.relative(&path).display()))
        .map_err(ToolError::Io)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Write `contents` to a file inside the project, creating parent directories.
///
/// Refuses to replace an existing file unless `overwrite` is set.
pub fn save_file(
    sandbox: &Sandbox,
    requested: &Path,
    contents: &str,
    overwrite: bool,
) -> ToolResult<PathBuf> {
    let path = sandbox.resolve_for_write(requested)?;
    if path.exists() && !overwrite {
        return Err(ToolError::invalid_arguments(
            "write",
            format!(
                "{} already exists (pass overwrite to replace it)",
                requested.display()
            ),
        ));
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))
            .map_err(ToolError::Io)?;
    }
    fs::write(&path, contents)
        .with_context(|| format!("write {}", path.display()))
        .map_err(ToolError::Io)?;
    info!(path = %path.display(), bytes = contents.len(), "saved file");
    Ok(path)
}

/// List a directory inside the project (default: the root).
///
/// Entries are root-relative, sorted, and directories end with `/`.
pub fn list_files(sandbox: &Sandbox, dir: Option<&Path>) -> ToolResult<Vec<String>> {
    let dir = sandbox.resolve_dir(dir)?;
    let entries = fs::read_dir(&dir)
        .with_context(|| format!("list {}", dir.display()))
        .map_err(ToolError::Io)?;
    let mut listed = Vec::new();
    for entry in entries {
        let entry = entry
            .with_context(|| format!("list {}", dir.display()))
            .map_err(ToolError::Io)?;
        let path = entry.path();
        let mut name = sandbox.relative(&path).to_string_lossy().into_owned();
        if path.is_dir() {
            name.push('/');
        }
        listed.push(name);
    }
    listed.sort();
    Ok(listed)
}
