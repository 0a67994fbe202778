//! The sandboxed project root and its path policy.
//!
//! All file-scoped operations go through [`Sandbox`]. A target is accepted
//! only if it resolves strictly below the root, both lexically and after
//! following symlinks.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{debug, warn};

use crate::core::path::{is_strictly_within, is_within, normalize_lexically};
use crate::error::{ToolError, ToolResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sandbox {
    root: PathBuf,
}

impl Sandbox {
    /// The root must exist and be a directory; it is canonicalized here once.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let canonical = root
            .canonicalize()
            .with_context(|| format!("resolve project root {}", root.display()))?;
        if !canonical.is_dir() {
            bail!("project root {} is not a directory", canonical.display());
        }
        debug!(root = %canonical.display(), "sandbox ready");
        Ok(Self { root: canonical })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve an existing file (or directory) strictly inside the root.
    pub fn resolve_existing(&self, requested: &Path) -> ToolResult<PathBuf> {
        let candidate = self.locate(requested, is_strictly_within)?;
        if !candidate.exists() {
            debug!(path = %candidate.display(), "target does not exist");
            return Err(ToolError::NotFound {
                path: requested.to_path_buf(),
            });
        }
        let canonical = canonicalize(&candidate)?;
        if !is_strictly_within(&self.root, &canonical) {
            return Err(self.deny(requested));
        }
        Ok(canonical)
    }

    /// Resolve a directory inside the root; the root itself is allowed.
    pub fn resolve_dir(&self, requested: Option<&Path>) -> ToolResult<PathBuf> {
        let Some(requested) = requested else {
            return Ok(self.root.clone());
        };
        let candidate = self.locate(requested, is_within)?;
        if !candidate.exists() {
            return Err(ToolError::NotFound {
                path: requested.to_path_buf(),
            });
        }
        let canonical = canonicalize(&candidate)?;
        if !is_within(&self.root, &canonical) {
            return Err(self.deny(requested));
        }
        Ok(canonical)
    }

    /// Resolve a file that may not exist yet.
    ///
    /// An existing target must canonicalize strictly inside the root. For a
    /// new target, no component below the root may be a dangling symlink and
    /// the deepest existing ancestor must canonicalize inside the root.
    pub fn resolve_for_write(&self, requested: &Path) -> ToolResult<PathBuf> {
        let candidate = self.locate(requested, is_strictly_within)?;
        if candidate.exists() {
            let canonical = canonicalize(&candidate)?;
            if !is_strictly_within(&self.root, &canonical) {
                return Err(self.deny(requested));
            }
            return Ok(canonical);
        }
        // A write through a dangling link lands wherever the link points.
        if candidate
            .ancestors()
            .take_while(|path| is_strictly_within(&self.root, path))
            .any(is_dangling_symlink)
        {
            return Err(self.deny(requested));
        }
        let ancestor = candidate
            .ancestors()
            .skip(1)
            .find(|path| path.exists())
            .unwrap_or(self.root.as_path());
        let canonical = canonicalize(ancestor)?;
        if !is_within(&self.root, &canonical) {
            return Err(self.deny(requested));
        }
        Ok(candidate)
    }

    /// Root-relative display form of a resolved path.
    pub fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }

    /// Join and clean `requested`, then check it with `within`.
    ///
    /// A path that fails the lexical check gets a second chance with its
    /// deepest existing ancestor canonicalized, so targets spelled through a
    /// symlinked alias of the root (`/var` for `/private/var`) still match.
    fn locate(
        &self,
        requested: &Path,
        within: fn(&Path, &Path) -> bool,
    ) -> ToolResult<PathBuf> {
        let candidate = self.join(requested);
        if within(&self.root, &candidate) {
            return Ok(candidate);
        }
        let realigned = realign(&candidate)?;
        if within(&self.root, &realigned) {
            debug!(
                path = %candidate.display(),
                resolved = %realigned.display(),
                "target matched root after canonicalizing"
            );
            return Ok(realigned);
        }
        Err(self.deny(requested))
    }

    fn join(&self, requested: &Path) -> PathBuf {
        if requested.is_absolute() {
            normalize_lexically(requested)
        } else {
            normalize_lexically(&self.root.join(requested))
        }
    }

    fn deny(&self, requested: &Path) -> ToolError {
        warn!(
            path = %requested.display(),
            root = %self.root.display(),
            "path escapes project root"
        );
        ToolError::AccessDenied {
            path: requested.to_path_buf(),
        }
    }
}

/// Canonicalize the deepest existing ancestor of `path` and re-append the
/// components below it.
fn realign(path: &Path) -> ToolResult<PathBuf> {
    let Some(existing) = path.ancestors().find(|ancestor| ancestor.exists()) else {
        return Ok(path.to_path_buf());
    };
    let canonical = canonicalize(existing)?;
    match path.strip_prefix(existing) {
        Ok(rest) if !rest.as_os_str().is_empty() => Ok(canonical.join(rest)),
        _ => Ok(canonical),
    }
}

fn is_dangling_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|meta| meta.file_type().is_symlink()) && !path.exists()
}

fn canonicalize(path: &Path) -> ToolResult<PathBuf> {
    path.canonicalize()
        .with_context(|| format!("resolve {}", path.display()))
        .map_err(ToolError::Io)
}
