//! Tree-wide invariant validation.
//!
//! Walks a name-encoded store root and reports every directory in which two
//! siblings share an ordinal. Duplicates are a defect, not cosmetic: all
//! downstream ordering depends on the uniqueness invariant.

use crate::error::{EngineError, StorageError};
use crate::ordinal::encoding;
use std::collections::HashMap;
use std::path::Path;
use walkdir::WalkDir;

/// One detected uniqueness violation.
#[derive(Debug, Clone, serde::Serialize)]
pub struct OrdinalViolation {
    pub directory: String,
    pub ordinal: crate::types::Ordinal,
    pub names: Vec<String>,
}

/// Scan the whole tree under `root` for duplicate sibling ordinals.
pub fn duplicate_ordinals(root: &Path) -> Result<Vec<OrdinalViolation>, EngineError> {
    let mut violations = Vec::new();
    for entry in WalkDir::new(root).min_depth(0).into_iter().filter_entry(|e| {
        e.file_name()
            .to_str()
            .map(|n| e.depth() == 0 || !n.starts_with('.'))
            .unwrap_or(false)
    }) {
        let entry = entry.map_err(|e| {
            EngineError::Storage(StorageError::Backend(format!(
                "walk failed under {}: {}",
                root.display(),
                e
            )))
        })?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let mut by_ordinal: HashMap<crate::types::Ordinal, Vec<String>> = HashMap::new();
        let listing = match std::fs::read_dir(entry.path()) {
            Ok(listing) => listing,
            Err(_) => continue,
        };
        for child in listing.flatten() {
            let name = child.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            if let (Some(ordinal), _) = encoding::decode(&name) {
                by_ordinal.entry(ordinal).or_default().push(name);
            }
        }
        for (ordinal, mut names) in by_ordinal {
            if names.len() > 1 {
                names.sort();
                violations.push(OrdinalViolation {
                    directory: entry.path().display().to_string(),
                    ordinal,
                    names,
                });
            }
        }
    }
    violations.sort_by(|a, b| a.directory.cmp(&b.directory).then(a.ordinal.cmp(&b.ordinal)));
    Ok(violations)
}
