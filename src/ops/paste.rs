//! Cut/paste: cross-folder moves and same-folder reordering.
//!
//! Cross-folder: the target directory is shifted open before any move, and
//! the shift's rename map translates source paths that were nested under a
//! renamed ancestor. Same-folder: the moved items are staged out to hidden
//! temporary names first, the shift runs over the vacated slots, then each
//! staged item is renamed into its final position in ordinal order.

use super::{map_conflict, MutationService};
use crate::error::EngineError;
use crate::ordinal::{allocate, shift_down};
use crate::types::{remap_path, Ordinal, RenamePair};
use serde::Serialize;
use tracing::info;

/// Result of a paste: old stored path to final stored path, one pair per
/// moved item.
#[derive(Debug, Clone, Serialize)]
pub struct PasteOutcome {
    pub moved: Vec<RenamePair>,
}

impl MutationService {
    /// Move `names` out of `source_parent` and insert them into
    /// `target_parent`, at the top by default or immediately after `anchor`
    /// (a stored sibling name in the target). Items land at sequential
    /// ordinals in their current ordinal order. Source and target may be
    /// the same directory, which reorders in place.
    pub fn paste(
        &self,
        source_parent: &str,
        names: &[String],
        target_parent: &str,
        anchor: Option<&str>,
    ) -> Result<PasteOutcome, EngineError> {
        if names.is_empty() {
            return Err(EngineError::InvalidOperation("nothing to paste".to_string()));
        }
        let source = self.prepare_parent(source_parent)?;
        let target = self.prepare_parent(target_parent)?;

        let (lock_a, lock_b) = self.locks().get_lock_pair(&source, &target);
        let _guard_a = lock_a.write();
        let _guard_b = lock_b.as_ref().map(|lock| lock.write());

        if let Some(anchor_name) = anchor {
            if source == target && names.iter().any(|n| n == anchor_name) {
                return Err(EngineError::InvalidOperation(
                    "anchor is among the items being pasted".to_string(),
                ));
            }
        }

        // Items move in ordinal order so temp-name bookkeeping and final
        // placement are deterministic.
        let mut items: Vec<(String, Ordinal)> = Vec::with_capacity(names.len());
        for name in names {
            let path = crate::path::join(&source, name);
            if !self.storage().exists(&path)? {
                return Err(EngineError::NotFound(path));
            }
            items.push((name.clone(), self.storage().ordinal_of(&path)?.unwrap_or(0)));
        }
        items.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

        let pivot = allocate(self.anchor_for(&target, anchor)?);
        let moved = if source == target {
            self.reorder_within(&source, &items, pivot)?
        } else {
            self.move_across(&source, &target, &items, pivot)?
        };
        info!(
            source = source.as_str(),
            target = target.as_str(),
            count = moved.len(),
            "pasted"
        );
        Ok(PasteOutcome { moved })
    }

    fn move_across(
        &self,
        source: &str,
        target: &str,
        items: &[(String, Ordinal)],
        pivot: Ordinal,
    ) -> Result<Vec<RenamePair>, EngineError> {
        let slots = items.len() as u32;
        // Shift before the moves so inserted items land in the gap; the
        // rename map covers the case where the source directory itself sits
        // under a renamed target child.
        let renames = shift_down(self.storage(), target, pivot, slots)?;

        let mut moved = Vec::with_capacity(items.len());
        for (index, (name, _)) in items.iter().enumerate() {
            let stale = crate::path::join(source, name);
            let from = remap_path(&stale, &renames);
            let ordinal = pivot + index as Ordinal;
            let to = crate::path::join(
                target,
                &self
                    .storage()
                    .stored_name(self.storage().base_name(name), ordinal),
            );
            self.storage().rename(&from, &to).map_err(map_conflict)?;
            if !self.storage().encodes_ordinals() {
                self.storage().set_ordinal(&to, ordinal)?;
            }
            moved.push(RenamePair {
                old_path: stale,
                new_path: to,
            });
        }
        Ok(moved)
    }

    fn reorder_within(
        &self,
        parent: &str,
        items: &[(String, Ordinal)],
        pivot: Ordinal,
    ) -> Result<Vec<RenamePair>, EngineError> {
        // A moved item is both a sibling being shifted and an item being
        // inserted; stage them all out first so the shift only ever sees
        // the remaining siblings.
        let mut staged = Vec::with_capacity(items.len());
        for (name, _) in items {
            let from = crate::path::join(parent, name);
            let temp = crate::path::join(parent, &crate::path::staging_name(&from));
            self.storage().rename(&from, &temp)?;
            staged.push((name.clone(), temp));
        }

        shift_down(self.storage(), parent, pivot, items.len() as u32)?;

        let mut moved = Vec::with_capacity(staged.len());
        for (index, (name, temp)) in staged.iter().enumerate() {
            let ordinal = pivot + index as Ordinal;
            let to = crate::path::join(
                parent,
                &self
                    .storage()
                    .stored_name(self.storage().base_name(name), ordinal),
            );
            self.storage().rename(temp, &to).map_err(map_conflict)?;
            if !self.storage().encodes_ordinals() {
                self.storage().set_ordinal(&to, ordinal)?;
            }
            moved.push(RenamePair {
                old_path: crate::path::join(parent, name),
                new_path: to,
            });
        }
        Ok(moved)
    }

}
