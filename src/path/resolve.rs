//! Friendly-path resolution.
//!
//! A friendly path carries no ordinal prefixes ("/notes/chapter one.md");
//! each segment is matched case-insensitively against the ordinal-stripped
//! names of the current directory's visible entries. Exact stored names
//! also match, so stored and friendly segments can be mixed in one path.
//! An unmatched segment is a typed NOT_FOUND outcome (`Ok(None)`), never
//! an error; callers decide the fallback.

use crate::error::{EngineError, StorageError};
use crate::ordinal::encoding;
use crate::storage::TreeStorage;
use unicode_normalization::UnicodeNormalization;

/// Case-insensitive match key: NFC-normalized then lowercased.
fn fold(name: &str) -> String {
    name.nfc().collect::<String>().to_lowercase()
}

/// Resolve a friendly path to the stored path of the entry it names.
///
/// Traversal segments are rejected with `Boundary` before any lookup;
/// resolution can never escape the configured root.
pub fn resolve_friendly_path(
    storage: &dyn TreeStorage,
    path: &str,
) -> Result<Option<String>, EngineError> {
    let normalized = crate::path::normalize(path);
    crate::path::validate_segments(&normalized)?;
    if normalized == "/" {
        return Ok(Some(normalized));
    }

    let mut current = String::from("/");
    for segment in normalized[1..].split('/') {
        let names = match storage.read_dir(&current) {
            Ok(names) => names,
            // A file mid-path or a vanished directory: no match.
            Err(StorageError::NotADirectory(_)) | Err(StorageError::NotFound(_)) => {
                return Ok(None)
            }
            Err(e) => return Err(e.into()),
        };
        let target = fold(segment);
        let matched = names
            .into_iter()
            .filter(|name| !crate::path::is_hidden(name))
            .find(|name| fold(name) == target || fold(encoding::strip(name)) == target);
        match matched {
            Some(name) => current = crate::path::join(&current, &name),
            None => return Ok(None),
        }
    }
    Ok(Some(current))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FsStore, TreeStorage};
    use tempfile::TempDir;

    fn store() -> (TempDir, FsStore) {
        let dir = TempDir::new().unwrap();
        let store = FsStore::open(dir.path(), 4, "local").unwrap();
        store.mkdir("/0000_Projects", false).unwrap();
        store
            .write_file("/0000_Projects/0000_Roadmap.md", "plan")
            .unwrap();
        store.write_file("/0001_inbox.md", "inbox").unwrap();
        (dir, store)
    }

    #[test]
    fn resolves_case_insensitively_across_prefixes() {
        let (_dir, store) = store();
        let resolved = resolve_friendly_path(&store, "/projects/roadmap.md").unwrap();
        assert_eq!(resolved.as_deref(), Some("/0000_Projects/0000_Roadmap.md"));
    }

    #[test]
    fn root_resolves_to_itself() {
        let (_dir, store) = store();
        assert_eq!(
            resolve_friendly_path(&store, "/").unwrap().as_deref(),
            Some("/")
        );
    }

    #[test]
    fn unmatched_segment_is_not_found_outcome() {
        let (_dir, store) = store();
        assert_eq!(resolve_friendly_path(&store, "/projects/missing.md").unwrap(), None);
        assert_eq!(resolve_friendly_path(&store, "/nowhere/at/all").unwrap(), None);
    }

    #[test]
    fn file_mid_path_is_not_found_outcome() {
        let (_dir, store) = store();
        assert_eq!(
            resolve_friendly_path(&store, "/inbox.md/deeper").unwrap(),
            None
        );
    }

    #[test]
    fn traversal_is_rejected_before_lookup() {
        let (_dir, store) = store();
        assert!(matches!(
            resolve_friendly_path(&store, "/projects/../secret"),
            Err(EngineError::Boundary(_))
        ));
    }

    #[test]
    fn hidden_entries_are_skipped() {
        let (_dir, store) = store();
        store.write_file("/.hidden.md", "x").unwrap();
        assert_eq!(resolve_friendly_path(&store, "/.hidden.md").unwrap(), None);
    }
}
