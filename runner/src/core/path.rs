//! Lexical path helpers for sandbox containment checks.

use std::path::{Path, PathBuf};

/// Collapse `.` and `..` components without touching the filesystem.
///
/// `..` at the filesystem root is dropped, so an absolute input never climbs
/// above `/`. Leading `..` on a relative input is kept.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    path_clean::clean(path)
}

/// Returns true if `path` lies below `root`. The root itself does not count.
///
/// Both paths must already be normalized; comparison is per component, so
/// `/tmp/project-old` is not inside `/tmp/project`.
pub fn is_strictly_within(root: &Path, path: &Path) -> bool {
    path != root && path.starts_with(root)
}

/// Like [`is_strictly_within`], but accepts the root itself.
pub fn is_within(root: &Path, path: &Path) -> bool {
    path.starts_with(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_resolves_parent_segments() {
        assert_eq!(
            normalize_lexically(Path::new("/tmp/project/../outside.py")),
            PathBuf::from("/tmp/outside.py")
        );
        assert_eq!(
            normalize_lexically(Path::new("/a/./b/../c")),
            PathBuf::from("/a/c")
        );
    }

    #[test]
    fn normalize_stops_at_filesystem_root() {
        assert_eq!(
            normalize_lexically(Path::new("/../../etc/passwd")),
            PathBuf::from("/etc/passwd")
        );
    }

    #[test]
    fn normalize_keeps_leading_parent_on_relative_paths() {
        assert_eq!(
            normalize_lexically(Path::new("a/../../b")),
            PathBuf::from("../b")
        );
    }

    #[test]
    fn strictly_within_rejects_root_and_siblings() {
        let root = Path::new("/tmp/project");
        assert!(is_strictly_within(root, Path::new("/tmp/project/src/a.py")));
        assert!(!is_strictly_within(root, Path::new("/tmp/project")));
        assert!(!is_strictly_within(root, Path::new("/tmp/project-old/a.py")));
        assert!(!is_strictly_within(root, Path::new("/tmp/outside.py")));
    }

    #[test]
    fn within_accepts_root() {
        let root = Path::new("/tmp/project");
        assert!(is_within(root, root));
        assert!(!is_within(root, Path::new("/tmp")));
    }
}
