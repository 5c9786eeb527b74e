//! Core types for the ordinal-ordered document tree engine.

use serde::{Deserialize, Serialize};

/// Ordinal: a sibling's position within its parent directory's sort order.
pub type Ordinal = u32;

/// Classification of a materialized node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Directory,
    Text,
    Image,
    Binary,
}

/// A stored-path rename produced by an ordinal reassignment.
///
/// When a name-encoded store changes an ordinal prefix, the entry's stored
/// path changes with it; descendants of a renamed directory are reachable
/// only through the new path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenamePair {
    pub old_path: String,
    pub new_path: String,
}

/// Stored-path renames keyed by old path, for translating stale references
/// held across a shift.
pub type RenameMap = Vec<RenamePair>;

/// Translate a stored path through a rename map.
///
/// Matches both the path itself and any ancestor prefix, so descendants of a
/// renamed directory are remapped too. Returns the path unchanged when no
/// pair applies.
pub fn remap_path(path: &str, renames: &RenameMap) -> String {
    for pair in renames {
        if path == pair.old_path {
            return pair.new_path.clone();
        }
        let prefix = format!("{}/", pair.old_path);
        if let Some(rest) = path.strip_prefix(&prefix) {
            return format!("{}/{}", pair.new_path, rest);
        }
    }
    path.to_string()
}
