//! Mutation orchestration.
//!
//! Composes the ordinal engine behind operation-shaped entry points:
//! create, rename, delete, move up/down, cut/paste, join, split, and
//! convert-to-folder. Operations take normalized stored paths (resolve
//! friendly input through `path::resolve` first) and return typed result
//! payloads or a typed `EngineError`. Every mutation holds the exclusive
//! lock for its parent directory for its full duration; a storage failure
//! mid-sequence leaves the directory duplicate-free, possibly gapped, and
//! is surfaced without rollback.

mod paste;
mod text;

pub use paste::PasteOutcome;
pub use text::{ConvertOutcome, JoinOutcome, SplitOutcome};

use crate::concurrency::PathLockManager;
use crate::config::EngineConfig;
use crate::error::{EngineError, StorageError};
use crate::ordinal::{allocate, encoding, shift_down, swap, InsertAnchor, SwapDirection, SwapOutcome};
use crate::storage::TreeStorage;
use crate::types::Ordinal;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Result of a create-file operation.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedFile {
    pub file_name: String,
}

/// Result of a create-folder operation.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedFolder {
    pub folder_name: String,
}

/// Result of a rename.
#[derive(Debug, Clone, Serialize)]
pub struct RenameOutcome {
    pub old_name: String,
    pub new_name: String,
}

/// Result of a delete batch.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteOutcome {
    pub removed: Vec<String>,
}

/// Attempts before a create gives up disambiguating a colliding name.
const CREATE_RETRIES: usize = 4;

/// The mutation orchestrator.
pub struct MutationService {
    storage: Arc<dyn TreeStorage>,
    config: EngineConfig,
    locks: PathLockManager,
}

enum NewEntry<'a> {
    File(&'a str),
    Folder,
}

impl MutationService {
    pub fn new(storage: Arc<dyn TreeStorage>, config: EngineConfig) -> Self {
        Self {
            storage,
            config,
            locks: PathLockManager::new(),
        }
    }

    pub fn storage(&self) -> &dyn TreeStorage {
        self.storage.as_ref()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Shared lock registry, so readers wanting strict consistency can take
    /// the read side of a directory's lock.
    pub fn locks(&self) -> &PathLockManager {
        &self.locks
    }

    /// Create a text file in `parent`, at the top by default or immediately
    /// after `anchor` (a stored sibling name).
    pub fn create_file(
        &self,
        parent: &str,
        name: &str,
        content: &str,
        anchor: Option<&str>,
    ) -> Result<CreatedFile, EngineError> {
        let parent = self.prepare_parent(parent)?;
        let lock = self.locks.get_lock(&parent);
        let _guard = lock.write();

        let ordinal = allocate(self.anchor_for(&parent, anchor)?);
        shift_down(self.storage.as_ref(), &parent, ordinal, 1)?;
        let stored = self.place_new(&parent, name, ordinal, NewEntry::File(content))?;
        info!(parent = parent.as_str(), file = stored.as_str(), "created file");
        Ok(CreatedFile { file_name: stored })
    }

    /// Create a folder; same placement rules as `create_file`.
    pub fn create_folder(
        &self,
        parent: &str,
        name: &str,
        anchor: Option<&str>,
    ) -> Result<CreatedFolder, EngineError> {
        let parent = self.prepare_parent(parent)?;
        let lock = self.locks.get_lock(&parent);
        let _guard = lock.write();

        let ordinal = allocate(self.anchor_for(&parent, anchor)?);
        shift_down(self.storage.as_ref(), &parent, ordinal, 1)?;
        let stored = self.place_new(&parent, name, ordinal, NewEntry::Folder)?;
        info!(parent = parent.as_str(), folder = stored.as_str(), "created folder");
        Ok(CreatedFolder { folder_name: stored })
    }

    /// Pure name change; the ordinal (and any name-encoded prefix) is
    /// preserved.
    pub fn rename(
        &self,
        parent: &str,
        old_name: &str,
        new_name: &str,
    ) -> Result<RenameOutcome, EngineError> {
        let parent = self.prepare_parent(parent)?;
        let lock = self.locks.get_lock(&parent);
        let _guard = lock.write();

        let old_path = crate::path::join(&parent, old_name);
        if !self.storage.exists(&old_path)? {
            return Err(EngineError::NotFound(old_path));
        }
        let stored_new = match self.storage.ordinal_of(&old_path)? {
            Some(ordinal) if self.storage.encodes_ordinals() => {
                self.storage.stored_name(new_name, ordinal)
            }
            _ => new_name.to_string(),
        };
        if stored_new == old_name {
            return Ok(RenameOutcome {
                old_name: old_name.to_string(),
                new_name: stored_new,
            });
        }
        let new_path = crate::path::join(&parent, &stored_new);
        self.storage
            .rename(&old_path, &new_path)
            .map_err(map_conflict)?;
        info!(
            parent = parent.as_str(),
            old = old_name,
            new = stored_new.as_str(),
            "renamed"
        );
        Ok(RenameOutcome {
            old_name: old_name.to_string(),
            new_name: stored_new,
        })
    }

    /// Delete one or more entries. Surviving siblings are deliberately not
    /// renumbered; gaps in the ordinal sequence are valid and cheap.
    pub fn delete(&self, parent: &str, names: &[String]) -> Result<DeleteOutcome, EngineError> {
        let parent = self.prepare_parent(parent)?;
        let lock = self.locks.get_lock(&parent);
        let _guard = lock.write();

        let mut paths = Vec::with_capacity(names.len());
        for name in names {
            let path = crate::path::join(&parent, name);
            if !self.storage.exists(&path)? {
                return Err(EngineError::NotFound(path));
            }
            paths.push(path);
        }
        let mut removed = Vec::with_capacity(paths.len());
        for path in paths {
            self.storage.remove(&path, true)?;
            removed.push(path);
        }
        info!(parent = parent.as_str(), count = removed.len(), "deleted");
        Ok(DeleteOutcome { removed })
    }

    /// Swap the item with its previous sibling.
    pub fn move_up(&self, parent: &str, name: &str) -> Result<SwapOutcome, EngineError> {
        let parent = self.prepare_parent(parent)?;
        let lock = self.locks.get_lock(&parent);
        let _guard = lock.write();
        swap(self.storage.as_ref(), &parent, name, SwapDirection::Up)
    }

    /// Swap the item with its next sibling.
    pub fn move_down(&self, parent: &str, name: &str) -> Result<SwapOutcome, EngineError> {
        let parent = self.prepare_parent(parent)?;
        let lock = self.locks.get_lock(&parent);
        let _guard = lock.write();
        swap(self.storage.as_ref(), &parent, name, SwapDirection::Down)
    }

    // --- shared helpers ---

    fn prepare_parent(&self, parent: &str) -> Result<String, EngineError> {
        let parent = crate::path::normalize(parent);
        crate::path::validate_segments(&parent)?;
        if !self.storage.exists(&parent)? {
            return Err(EngineError::NotFound(parent));
        }
        Ok(parent)
    }

    fn anchor_for(
        &self,
        parent: &str,
        anchor: Option<&str>,
    ) -> Result<InsertAnchor, EngineError> {
        match anchor {
            None => Ok(InsertAnchor::Top),
            Some(name) => {
                let path = crate::path::join(parent, name);
                if !self.storage.exists(&path)? {
                    return Err(EngineError::NotFound(path));
                }
                match self.storage.ordinal_of(&path)? {
                    Some(ordinal) => Ok(InsertAnchor::After(ordinal)),
                    None => Err(EngineError::InvalidOperation(format!(
                        "anchor has no assigned ordinal: {}",
                        path
                    ))),
                }
            }
        }
    }

    /// Write a new entry at an ordinal the caller already opened. On name
    /// collision, retries with a randomized disambiguating suffix instead
    /// of failing outright.
    fn place_new(
        &self,
        parent: &str,
        name: &str,
        ordinal: Ordinal,
        entry: NewEntry<'_>,
    ) -> Result<String, EngineError> {
        for attempt in 0..=CREATE_RETRIES {
            let candidate = if attempt == 0 {
                name.to_string()
            } else {
                disambiguate(name, attempt)
            };
            let stored = self.storage.stored_name(&candidate, ordinal);
            let path = crate::path::join(parent, &stored);
            if self.storage.exists(&path)? {
                continue;
            }
            match &entry {
                NewEntry::File(content) => self.storage.write_file(&path, content)?,
                NewEntry::Folder => self.storage.mkdir(&path, false)?,
            }
            if !self.storage.encodes_ordinals() {
                self.storage.set_ordinal(&path, ordinal)?;
            }
            return Ok(stored);
        }
        Err(EngineError::Conflict(crate::path::join(parent, name)))
    }
}

/// Suffix a colliding name before its extension: `notes.md` becomes
/// `notes-4f2a.md`.
fn disambiguate(name: &str, attempt: usize) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let digest = blake3::hash(format!("{}:{}:{}", name, nanos, attempt).as_bytes());
    let suffix = &hex::encode(digest.as_bytes())[..4];
    let path = Path::new(name);
    match (path.file_stem().and_then(|s| s.to_str()), path.extension().and_then(|e| e.to_str())) {
        (Some(stem), Some(ext)) => format!("{}-{}.{}", stem, suffix, ext),
        _ => format!("{}-{}", name, suffix),
    }
}

pub(crate) fn map_conflict(e: StorageError) -> EngineError {
    match e {
        StorageError::AlreadyExists(path) => EngineError::Conflict(path),
        other => EngineError::Storage(other),
    }
}

/// Whether the (ordinal-stripped) name carries a text extension.
pub(crate) fn is_text_name(config: &EngineConfig, name: &str) -> bool {
    Path::new(encoding::strip(name))
        .extension()
        .and_then(|e| e.to_str())
        .map(|ext| config.is_text_extension(ext))
        .unwrap_or(false)
}
