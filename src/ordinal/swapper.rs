//! Adjacent-sibling ordinal exchange (move up / move down).
//!
//! On a name-encoded store, swapping two siblings that share an ordinal-free
//! name would transiently collide if done as two direct renames; the swap
//! therefore stages the moving item out under a hidden temporary name,
//! renames the neighbor into the vacated slot, and renames the staged item
//! into its target. A store with atomic ordinal batches swaps both rows in
//! one update instead.

use crate::error::EngineError;
use crate::ordinal::assigned_siblings;
use crate::storage::TreeStorage;
use crate::types::RenamePair;
use tracing::debug;

/// Direction of a sibling swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapDirection {
    Up,
    Down,
}

/// Stored-path changes produced by a swap. For a metadata-ordinal store the
/// old and new paths are identical.
#[derive(Debug, Clone)]
pub struct SwapOutcome {
    /// The item that was moved.
    pub moved_a: RenamePair,
    /// The neighbor it traded places with.
    pub moved_b: RenamePair,
}

/// Exchange the ordinals of `item_name` and its neighbor in `direction`.
///
/// `AtBoundary` when the item is already first (up) or last (down); callers
/// report this, they do not retry.
pub fn swap(
    storage: &dyn TreeStorage,
    parent: &str,
    item_name: &str,
    direction: SwapDirection,
) -> Result<SwapOutcome, EngineError> {
    let siblings = assigned_siblings(storage, parent)?;
    let idx = siblings
        .iter()
        .position(|(name, _)| name == item_name)
        .ok_or_else(|| EngineError::NotFound(crate::path::join(parent, item_name)))?;

    let neighbor_idx = match direction {
        SwapDirection::Up => {
            if idx == 0 {
                return Err(EngineError::AtBoundary("top"));
            }
            idx - 1
        }
        SwapDirection::Down => {
            if idx + 1 == siblings.len() {
                return Err(EngineError::AtBoundary("bottom"));
            }
            idx + 1
        }
    };

    let (item, item_ordinal) = &siblings[idx];
    let (neighbor, neighbor_ordinal) = &siblings[neighbor_idx];
    let item_path = crate::path::join(parent, item);
    let neighbor_path = crate::path::join(parent, neighbor);

    debug!(
        parent = parent,
        item = item.as_str(),
        neighbor = neighbor.as_str(),
        "swapping sibling ordinals"
    );

    if storage.atomic_ordinals() {
        storage.set_ordinals(&[
            (item_path.clone(), *neighbor_ordinal),
            (neighbor_path.clone(), *item_ordinal),
        ])?;
        return Ok(SwapOutcome {
            moved_a: unchanged(&item_path),
            moved_b: unchanged(&neighbor_path),
        });
    }

    // Three-step staged swap: the minimal collision-free sequence.
    let temp_path = crate::path::join(parent, &crate::path::staging_name(&item_path));
    storage.rename(&item_path, &temp_path)?;
    let neighbor_pair = storage
        .set_ordinal(&neighbor_path, *item_ordinal)?
        .unwrap_or_else(|| unchanged(&neighbor_path));
    let target_path = crate::path::join(
        parent,
        &storage.stored_name(storage.base_name(item), *neighbor_ordinal),
    );
    storage.rename(&temp_path, &target_path)?;

    Ok(SwapOutcome {
        moved_a: RenamePair {
            old_path: item_path,
            new_path: target_path,
        },
        moved_b: neighbor_pair,
    })
}

fn unchanged(path: &str) -> RenamePair {
    RenamePair {
        old_path: path.to_string(),
        new_path: path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ordinal::assigned_siblings;
    use crate::storage::{FsStore, MetaStore, TreeStorage};
    use tempfile::TempDir;

    fn fs_store() -> (TempDir, FsStore) {
        let dir = TempDir::new().unwrap();
        let store = FsStore::open(dir.path(), 4, "local").unwrap();
        store.write_file("/0000_x.md", "x").unwrap();
        store.write_file("/0001_y.md", "y").unwrap();
        store.write_file("/0002_z.md", "z").unwrap();
        (dir, store)
    }

    fn order(storage: &dyn TreeStorage) -> Vec<String> {
        assigned_siblings(storage, "/")
            .unwrap()
            .into_iter()
            .map(|(name, _)| name)
            .collect()
    }

    #[test]
    fn move_up_swaps_with_previous() {
        let (_dir, store) = fs_store();
        let outcome = swap(&store, "/", "0001_y.md", SwapDirection::Up).unwrap();
        assert_eq!(outcome.moved_a.new_path, "/0000_y.md");
        assert_eq!(outcome.moved_b.new_path, "/0001_x.md");
        assert_eq!(order(&store), vec!["0000_y.md", "0001_x.md", "0002_z.md"]);
    }

    #[test]
    fn up_then_down_restores_original_assignment() {
        let (_dir, store) = fs_store();
        let before = assigned_siblings(&store, "/").unwrap();
        swap(&store, "/", "0001_y.md", SwapDirection::Up).unwrap();
        swap(&store, "/", "0000_y.md", SwapDirection::Down).unwrap();
        assert_eq!(assigned_siblings(&store, "/").unwrap(), before);
    }

    #[test]
    fn boundary_is_reported_not_retried() {
        let (_dir, store) = fs_store();
        assert!(matches!(
            swap(&store, "/", "0000_x.md", SwapDirection::Up),
            Err(EngineError::AtBoundary("top"))
        ));
        assert!(matches!(
            swap(&store, "/", "0002_z.md", SwapDirection::Down),
            Err(EngineError::AtBoundary("bottom"))
        ));
        // Order untouched.
        assert_eq!(order(&store), vec!["0000_x.md", "0001_y.md", "0002_z.md"]);
    }

    #[test]
    fn swap_handles_shared_friendly_names() {
        let dir = TempDir::new().unwrap();
        let store = FsStore::open(dir.path(), 4, "local").unwrap();
        store.write_file("/0000_x.md", "first").unwrap();
        store.write_file("/0001_x.md", "second").unwrap();

        // Direct renames would collide here; the staged swap must not.
        swap(&store, "/", "0001_x.md", SwapDirection::Up).unwrap();
        assert_eq!(store.read_file("/0000_x.md").unwrap(), "second");
        assert_eq!(store.read_file("/0001_x.md").unwrap(), "first");
    }

    #[test]
    fn missing_item_is_not_found() {
        let (_dir, store) = fs_store();
        assert!(matches!(
            swap(&store, "/", "0009_missing.md", SwapDirection::Up),
            Err(EngineError::NotFound(_))
        ));
    }

    #[test]
    fn metadata_store_swaps_in_place() {
        let store = MetaStore::temporary("local").unwrap();
        store.write_file("/x.md", "x").unwrap();
        store.write_file("/y.md", "y").unwrap();
        store.set_ordinal("/x.md", 0).unwrap();
        store.set_ordinal("/y.md", 1).unwrap();

        let outcome = swap(&store, "/", "y.md", SwapDirection::Up).unwrap();
        assert_eq!(outcome.moved_a.old_path, outcome.moved_a.new_path);
        assert_eq!(store.ordinal_of("/y.md").unwrap(), Some(0));
        assert_eq!(store.ordinal_of("/x.md").unwrap(), Some(1));
    }
}
