//! Root-escape protection.
//!
//! Every storage-touching operation maps an engine path to an absolute path
//! through this check. A path that lexically or physically leaves the
//! configured root is rejected before anything is read or written.

use crate::error::StorageError;
use std::path::{Path, PathBuf};

/// Canonicalize a store root at construction time.
///
/// Uses `dunce` so Windows roots come back without UNC verbatim prefixes,
/// keeping later prefix comparisons stable.
pub fn canonical_root(root: &Path) -> Result<PathBuf, StorageError> {
    dunce::canonicalize(root).map_err(|e| StorageError::Io {
        path: root.display().to_string(),
        source: e,
    })
}

/// Map a normalized engine path onto the canonical root, rejecting any
/// escape attempt.
pub fn boundary_check(root: &Path, path: &str) -> Result<PathBuf, StorageError> {
    if !path.starts_with('/') {
        return Err(StorageError::Boundary(path.to_string()));
    }
    let mut abs = root.to_path_buf();
    for segment in path.split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        if segment == ".." || segment.contains(['/', '\\']) {
            return Err(StorageError::Boundary(path.to_string()));
        }
        abs.push(segment);
    }
    if !abs.starts_with(root) {
        return Err(StorageError::Boundary(path.to_string()));
    }
    Ok(abs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_rooted_paths() {
        let root = Path::new("/srv/store");
        assert_eq!(
            boundary_check(root, "/a/b.md").unwrap(),
            PathBuf::from("/srv/store/a/b.md")
        );
        assert_eq!(boundary_check(root, "/").unwrap(), PathBuf::from("/srv/store"));
    }

    #[test]
    fn rejects_traversal_and_relative() {
        let root = Path::new("/srv/store");
        assert!(boundary_check(root, "/a/../../etc").is_err());
        assert!(boundary_check(root, "a/b").is_err());
        assert!(boundary_check(root, "/..").is_err());
    }
}
