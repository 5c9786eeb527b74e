//! Storage-access interface for the tree engine.
//!
//! The engine mutates and materializes through this trait only; the two
//! implementations differ in where the ordinal lives. `FsStore` encodes it
//! as a digit prefix on the stored name (the canonical representation);
//! `MetaStore` keeps it as record metadata with atomic batch updates.
//! Shift/swap algorithms are written against the atomicity each
//! implementation reports, not against filesystem rename semantics.

pub mod boundary;
pub mod fs;
pub mod meta;

pub use fs::FsStore;
pub use meta::MetaStore;

use crate::error::StorageError;
use crate::types::{Ordinal, RenameMap, RenamePair};
use chrono::{DateTime, Utc};

/// Metadata for a single stored entry.
#[derive(Debug, Clone)]
pub struct StatInfo {
    pub is_directory: bool,
    pub size: u64,
    pub create_time: DateTime<Utc>,
    pub modify_time: DateTime<Utc>,
}

/// A directory entry with its storage-level metadata.
#[derive(Debug, Clone)]
pub struct EntryMeta {
    /// Stored name (ordinal prefix included for name-encoded stores).
    pub name: String,
    pub ordinal: Option<Ordinal>,
    pub is_directory: bool,
    pub size: u64,
    pub create_time: DateTime<Utc>,
    pub modify_time: DateTime<Utc>,
    pub owner_id: String,
    pub is_public: bool,
}

/// Storage-access interface.
///
/// All paths are normalized, rooted, stored-name paths ("/a/0001_b.md").
/// Implementations reject any path escaping the configured root before
/// touching the backing store.
pub trait TreeStorage: Send + Sync {
    fn exists(&self, path: &str) -> Result<bool, StorageError>;
    fn stat(&self, path: &str) -> Result<StatInfo, StorageError>;

    /// Stored names of all entries in a directory, hidden entries included.
    fn read_dir(&self, path: &str) -> Result<Vec<String>, StorageError>;

    fn read_file(&self, path: &str) -> Result<String, StorageError>;
    fn write_file(&self, path: &str, content: &str) -> Result<(), StorageError>;
    fn rename(&self, old: &str, new: &str) -> Result<(), StorageError>;
    fn remove(&self, path: &str, recursive: bool) -> Result<(), StorageError>;
    fn mkdir(&self, path: &str, recursive: bool) -> Result<(), StorageError>;

    /// Cheap non-empty probe, not a full listing.
    fn has_children(&self, path: &str) -> Result<bool, StorageError>;

    /// The entry's ordinal, however the implementation stores it.
    fn ordinal_of(&self, path: &str) -> Result<Option<Ordinal>, StorageError>;

    /// Assign an ordinal to an existing entry. Returns the stored-path
    /// rename this produced, if the implementation encodes ordinals in
    /// names; `None` when only metadata changed.
    fn set_ordinal(&self, path: &str, ordinal: Ordinal)
        -> Result<Option<RenamePair>, StorageError>;

    /// Whether a `set_ordinals` batch is applied atomically. When false,
    /// callers must order updates so no intermediate step writes a
    /// colliding name (descending ordinal order for a shift).
    fn atomic_ordinals(&self) -> bool;

    /// Whether ordinals are encoded into stored names.
    fn encodes_ordinals(&self) -> bool;

    /// Stored name for a friendly name at an ordinal.
    fn stored_name(&self, name: &str, ordinal: Ordinal) -> String;

    /// The name to carry to a new ordinal: ordinal-free for stores that
    /// encode ordinals into names, the stored name verbatim otherwise.
    fn base_name<'a>(&self, name: &'a str) -> &'a str {
        if self.encodes_ordinals() {
            crate::ordinal::encoding::strip(name)
        } else {
            name
        }
    }

    /// Apply a set of ordinal assignments. The default applies them one at
    /// a time in the given order; atomic implementations override with a
    /// single batch.
    fn set_ordinals(&self, updates: &[(String, Ordinal)]) -> Result<RenameMap, StorageError> {
        let mut renames = Vec::new();
        for (path, ordinal) in updates {
            if let Some(pair) = self.set_ordinal(path, *ordinal)? {
                renames.push(pair);
            }
        }
        Ok(renames)
    }

    /// Directory entries with metadata, composed from the primitives.
    fn read_dir_with_meta(&self, path: &str) -> Result<Vec<EntryMeta>, StorageError> {
        let mut entries = Vec::new();
        for name in self.read_dir(path)? {
            let child = crate::path::join(path, &name);
            let stat = self.stat(&child)?;
            let ordinal = self.ordinal_of(&child)?;
            entries.push(EntryMeta {
                name,
                ordinal,
                is_directory: stat.is_directory,
                size: stat.size,
                create_time: stat.create_time,
                modify_time: stat.modify_time,
                owner_id: self.owner_of(&child)?,
                is_public: self.visibility_of(&child)?,
            });
        }
        Ok(entries)
    }

    /// Owner attribute; stores without per-entry ownership report their
    /// configured default.
    fn owner_of(&self, path: &str) -> Result<String, StorageError>;

    /// Visibility attribute; defaults to private.
    fn visibility_of(&self, path: &str) -> Result<bool, StorageError>;
}
