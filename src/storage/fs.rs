//! Filesystem-backed store with name-encoded ordinals.
//!
//! The canonical representation: a sibling's ordinal is a digit prefix on
//! its on-disk name (`0002_chapter.md`). Ordinal reassignment is therefore
//! a rename, and a batch of reassignments is NOT atomic.
//!
//! Precondition for non-atomic batches: callers shifting ordinals upward
//! must apply updates in descending ordinal order, so no intermediate
//! rename targets a name another sibling still holds. `set_ordinal` refuses
//! to overwrite an existing target rather than silently clobbering it.

use crate::error::StorageError;
use crate::ordinal::encoding;
use crate::storage::boundary::{boundary_check, canonical_root};
use crate::storage::{StatInfo, TreeStorage};
use crate::types::{Ordinal, RenamePair};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

/// Name-encoded-ordinal store over a real filesystem directory.
pub struct FsStore {
    root: PathBuf,
    ordinal_width: usize,
    owner: String,
}

impl FsStore {
    /// Open a store rooted at `root`, creating the directory if absent.
    pub fn open(root: &Path, ordinal_width: usize, owner: &str) -> Result<Self, StorageError> {
        if !root.exists() {
            fs::create_dir_all(root).map_err(|e| io_err(&root.display().to_string(), e))?;
        }
        Ok(Self {
            root: canonical_root(root)?,
            ordinal_width,
            owner: owner.to_string(),
        })
    }

    fn abs(&self, path: &str) -> Result<PathBuf, StorageError> {
        boundary_check(&self.root, path)
    }
}

fn io_err(path: &str, e: std::io::Error) -> StorageError {
    if e.kind() == std::io::ErrorKind::NotFound {
        StorageError::NotFound(path.to_string())
    } else {
        StorageError::Io {
            path: path.to_string(),
            source: e,
        }
    }
}

fn timestamp(t: std::io::Result<std::time::SystemTime>) -> DateTime<Utc> {
    t.map(DateTime::<Utc>::from).unwrap_or_else(|_| Utc::now())
}

impl TreeStorage for FsStore {
    fn exists(&self, path: &str) -> Result<bool, StorageError> {
        Ok(self.abs(path)?.exists())
    }

    fn stat(&self, path: &str) -> Result<StatInfo, StorageError> {
        let abs = self.abs(path)?;
        let meta = fs::metadata(&abs).map_err(|e| io_err(path, e))?;
        Ok(StatInfo {
            is_directory: meta.is_dir(),
            size: meta.len(),
            // Creation time is unavailable on some filesystems; fall back
            // to the modification time.
            create_time: timestamp(meta.created().or_else(|_| meta.modified())),
            modify_time: timestamp(meta.modified()),
        })
    }

    fn read_dir(&self, path: &str) -> Result<Vec<String>, StorageError> {
        let abs = self.abs(path)?;
        if abs.exists() && !abs.is_dir() {
            return Err(StorageError::NotADirectory(path.to_string()));
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&abs).map_err(|e| io_err(path, e))? {
            let entry = entry.map_err(|e| io_err(path, e))?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    fn read_file(&self, path: &str) -> Result<String, StorageError> {
        let abs = self.abs(path)?;
        if abs.is_dir() {
            return Err(StorageError::NotAFile(path.to_string()));
        }
        fs::read_to_string(&abs).map_err(|e| io_err(path, e))
    }

    fn write_file(&self, path: &str, content: &str) -> Result<(), StorageError> {
        let abs = self.abs(path)?;
        if let Some(parent) = abs.parent() {
            if !parent.exists() {
                return Err(StorageError::NotFound(crate::path::parent_of(path)));
            }
        }
        fs::write(&abs, content).map_err(|e| io_err(path, e))
    }

    fn rename(&self, old: &str, new: &str) -> Result<(), StorageError> {
        let abs_old = self.abs(old)?;
        let abs_new = self.abs(new)?;
        if !abs_old.exists() {
            return Err(StorageError::NotFound(old.to_string()));
        }
        if abs_new.exists() {
            return Err(StorageError::AlreadyExists(new.to_string()));
        }
        fs::rename(&abs_old, &abs_new).map_err(|e| io_err(old, e))
    }

    fn remove(&self, path: &str, recursive: bool) -> Result<(), StorageError> {
        let abs = self.abs(path)?;
        if abs.is_dir() {
            if recursive {
                fs::remove_dir_all(&abs).map_err(|e| io_err(path, e))
            } else {
                fs::remove_dir(&abs).map_err(|e| io_err(path, e))
            }
        } else {
            fs::remove_file(&abs).map_err(|e| io_err(path, e))
        }
    }

    fn mkdir(&self, path: &str, recursive: bool) -> Result<(), StorageError> {
        let abs = self.abs(path)?;
        if abs.exists() {
            return Err(StorageError::AlreadyExists(path.to_string()));
        }
        if recursive {
            fs::create_dir_all(&abs).map_err(|e| io_err(path, e))
        } else {
            fs::create_dir(&abs).map_err(|e| io_err(path, e))
        }
    }

    fn has_children(&self, path: &str) -> Result<bool, StorageError> {
        let abs = self.abs(path)?;
        if !abs.is_dir() {
            return Ok(false);
        }
        let mut entries = fs::read_dir(&abs).map_err(|e| io_err(path, e))?;
        Ok(entries.next().is_some())
    }

    fn ordinal_of(&self, path: &str) -> Result<Option<Ordinal>, StorageError> {
        Ok(encoding::decode(crate::path::leaf_of(path)).0)
    }

    fn set_ordinal(
        &self,
        path: &str,
        ordinal: Ordinal,
    ) -> Result<Option<RenamePair>, StorageError> {
        let leaf = crate::path::leaf_of(path);
        let new_leaf = encoding::with_ordinal(leaf, ordinal, self.ordinal_width);
        if new_leaf == leaf {
            return Ok(None);
        }
        let new_path = crate::path::join(&crate::path::parent_of(path), &new_leaf);
        self.rename(path, &new_path)?;
        Ok(Some(RenamePair {
            old_path: path.to_string(),
            new_path,
        }))
    }

    fn atomic_ordinals(&self) -> bool {
        false
    }

    fn encodes_ordinals(&self) -> bool {
        true
    }

    fn stored_name(&self, name: &str, ordinal: Ordinal) -> String {
        encoding::encode(ordinal, name, self.ordinal_width)
    }

    fn owner_of(&self, _path: &str) -> Result<String, StorageError> {
        Ok(self.owner.clone())
    }

    fn visibility_of(&self, _path: &str) -> Result<bool, StorageError> {
        Ok(false)
    }
}
