//! Insertion-ordinal computation.

use crate::types::Ordinal;

/// Where a new or moved item lands among its future siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertAnchor {
    /// Insert at the top of the directory.
    Top,
    /// Insert immediately after the sibling holding this ordinal.
    After(Ordinal),
}

/// Compute the insertion ordinal for an anchor.
///
/// Pure computation, no mutation and no existence validation: an anchor
/// built from a stale sibling reference must be re-resolved by the caller
/// before allocating.
pub fn allocate(anchor: InsertAnchor) -> Ordinal {
    match anchor {
        InsertAnchor::Top => 0,
        InsertAnchor::After(ordinal) => ordinal + 1,
    }
}
