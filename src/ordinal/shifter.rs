//! Bulk ordinal shifting.
//!
//! Opens `slots` positions at a pivot by increasing the ordinal of every
//! sibling at or above it. Updates are submitted in descending ordinal
//! order: on a name-encoded store each reassignment is a rename, and
//! descending order guarantees no rename ever targets a name a
//! not-yet-shifted sibling still holds. A store with atomic ordinal batches
//! may apply them in any order; the descending precondition costs nothing
//! there.

use crate::error::EngineError;
use crate::ordinal::assigned_siblings;
use crate::storage::TreeStorage;
use crate::types::{Ordinal, RenameMap};
use tracing::debug;

/// Increase the ordinal of every sibling with `ordinal >= pivot` by `slots`.
///
/// Returns the stored-path renames this produced; callers holding paths to
/// descendants of a renamed directory must translate them through the map
/// (see `types::remap_path`) before continuing.
///
/// `slots == 0` is a no-op. A storage failure mid-sequence leaves the
/// directory partially shifted but duplicate-free (possibly gapped); the
/// error is surfaced without rollback.
pub fn shift_down(
    storage: &dyn TreeStorage,
    parent: &str,
    pivot: Ordinal,
    slots: u32,
) -> Result<RenameMap, EngineError> {
    if slots == 0 {
        return Ok(Vec::new());
    }

    let mut affected: Vec<(String, Ordinal)> = assigned_siblings(storage, parent)?
        .into_iter()
        .filter(|(_, ordinal)| *ordinal >= pivot)
        .collect();
    // Highest first; see module docs.
    affected.sort_by(|a, b| b.1.cmp(&a.1));

    let updates: Vec<(String, Ordinal)> = affected
        .into_iter()
        .map(|(name, ordinal)| (crate::path::join(parent, &name), ordinal + slots))
        .collect();

    debug!(
        parent = parent,
        pivot = pivot,
        slots = slots,
        affected = updates.len(),
        "shifting sibling ordinals"
    );

    Ok(storage.set_ordinals(&updates)?)
}
