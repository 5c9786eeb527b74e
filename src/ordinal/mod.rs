//! Ordinal engine: allocation, shifting, and swapping of sibling positions.

pub mod allocator;
pub mod encoding;
pub mod shifter;
pub mod swapper;

pub use allocator::{allocate, InsertAnchor};
pub use shifter::shift_down;
pub use swapper::{swap, SwapDirection, SwapOutcome};

use crate::error::StorageError;
use crate::storage::TreeStorage;
use crate::types::Ordinal;

/// Non-hidden siblings with assigned ordinals, sorted by ordinal then
/// case-insensitive ordinal-free name.
pub fn assigned_siblings(
    storage: &dyn TreeStorage,
    parent: &str,
) -> Result<Vec<(String, Ordinal)>, StorageError> {
    let mut entries = Vec::new();
    for name in storage.read_dir(parent)? {
        if crate::path::is_hidden(&name) {
            continue;
        }
        let child = crate::path::join(parent, &name);
        if let Some(ordinal) = storage.ordinal_of(&child)? {
            entries.push((name, ordinal));
        }
    }
    entries.sort_by(|a, b| {
        a.1.cmp(&b.1).then_with(|| {
            encoding::strip(&a.0)
                .to_lowercase()
                .cmp(&encoding::strip(&b.0).to_lowercase())
        })
    });
    Ok(entries)
}
