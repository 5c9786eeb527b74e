//! Metadata-ordinal store backed by sled.
//!
//! Ordinals live in bincode-serialized node records keyed by path, so an
//! ordinal reassignment never changes a stored path and a batch of
//! reassignments applies atomically through a single sled batch.

use crate::error::StorageError;
use crate::storage::{StatInfo, TreeStorage};
use crate::types::{Ordinal, RenameMap, RenamePair};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One stored node: type, ordinal, access attributes, timestamps, content.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct NodeRecord {
    is_directory: bool,
    ordinal: Option<Ordinal>,
    owner_id: String,
    is_public: bool,
    create_time_ms: i64,
    modify_time_ms: i64,
    content: Option<String>,
}

impl NodeRecord {
    fn new_dir(owner: &str, is_public: bool) -> Self {
        let now = Utc::now().timestamp_millis();
        Self {
            is_directory: true,
            ordinal: None,
            owner_id: owner.to_string(),
            is_public,
            create_time_ms: now,
            modify_time_ms: now,
            content: None,
        }
    }

    fn new_file(owner: &str, is_public: bool, content: &str) -> Self {
        let now = Utc::now().timestamp_millis();
        Self {
            is_directory: false,
            ordinal: None,
            owner_id: owner.to_string(),
            is_public,
            create_time_ms: now,
            modify_time_ms: now,
            content: Some(content.to_string()),
        }
    }
}

fn from_millis(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_else(Utc::now)
}

/// Metadata-ordinal store.
pub struct MetaStore {
    db: sled::Db,
    default_owner: String,
}

impl MetaStore {
    /// Open (or create) a store at a sled database path.
    pub fn open(path: &Path, default_owner: &str) -> Result<Self, StorageError> {
        let db = sled::open(path)?;
        let store = Self {
            db,
            default_owner: default_owner.to_string(),
        };
        store.ensure_root()?;
        Ok(store)
    }

    /// In-memory store for tests.
    pub fn temporary(default_owner: &str) -> Result<Self, StorageError> {
        let db = sled::Config::new().temporary(true).open()?;
        let store = Self {
            db,
            default_owner: default_owner.to_string(),
        };
        store.ensure_root()?;
        Ok(store)
    }

    fn ensure_root(&self) -> Result<(), StorageError> {
        if self.db.get(b"/")?.is_none() {
            self.put("/", &NodeRecord::new_dir(&self.default_owner, false))?;
        }
        Ok(())
    }

    fn get(&self, path: &str) -> Result<Option<NodeRecord>, StorageError> {
        match self.db.get(path.as_bytes())? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    fn record(&self, path: &str) -> Result<NodeRecord, StorageError> {
        self.get(path)?
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    fn put(&self, path: &str, record: &NodeRecord) -> Result<(), StorageError> {
        self.db
            .insert(path.as_bytes(), bincode::serialize(record)?)?;
        Ok(())
    }

    fn child_prefix(parent: &str) -> String {
        if parent == "/" {
            "/".to_string()
        } else {
            format!("{}/", parent)
        }
    }

    /// Keys of the entry itself plus its whole subtree.
    fn subtree_keys(&self, path: &str) -> Result<Vec<String>, StorageError> {
        let mut keys = vec![path.to_string()];
        let prefix = Self::child_prefix(path);
        for item in self.db.scan_prefix(prefix.as_bytes()) {
            let (key, _) = item?;
            let key = String::from_utf8_lossy(&key).into_owned();
            if key != path {
                keys.push(key);
            }
        }
        Ok(keys)
    }

    fn require_parent_dir(&self, path: &str) -> Result<NodeRecord, StorageError> {
        let parent = crate::path::parent_of(path);
        let record = self.record(&parent)?;
        if !record.is_directory {
            return Err(StorageError::NotADirectory(parent));
        }
        Ok(record)
    }
}

impl TreeStorage for MetaStore {
    fn exists(&self, path: &str) -> Result<bool, StorageError> {
        Ok(self.db.contains_key(path.as_bytes())?)
    }

    fn stat(&self, path: &str) -> Result<StatInfo, StorageError> {
        let record = self.record(path)?;
        Ok(StatInfo {
            is_directory: record.is_directory,
            size: record.content.as_ref().map(|c| c.len() as u64).unwrap_or(0),
            create_time: from_millis(record.create_time_ms),
            modify_time: from_millis(record.modify_time_ms),
        })
    }

    fn read_dir(&self, path: &str) -> Result<Vec<String>, StorageError> {
        let record = self.record(path)?;
        if !record.is_directory {
            return Err(StorageError::NotADirectory(path.to_string()));
        }
        let prefix = Self::child_prefix(path);
        let mut names = Vec::new();
        for item in self.db.scan_prefix(prefix.as_bytes()) {
            let (key, _) = item?;
            let key = String::from_utf8_lossy(&key).into_owned();
            let rest = &key[prefix.len()..];
            if !rest.is_empty() && !rest.contains('/') {
                names.push(rest.to_string());
            }
        }
        Ok(names)
    }

    fn read_file(&self, path: &str) -> Result<String, StorageError> {
        let record = self.record(path)?;
        record
            .content
            .ok_or_else(|| StorageError::NotAFile(path.to_string()))
    }

    fn write_file(&self, path: &str, content: &str) -> Result<(), StorageError> {
        match self.get(path)? {
            Some(mut record) => {
                if record.is_directory {
                    return Err(StorageError::NotAFile(path.to_string()));
                }
                record.content = Some(content.to_string());
                record.modify_time_ms = Utc::now().timestamp_millis();
                self.put(path, &record)
            }
            None => {
                // New entries inherit access attributes from the parent.
                let parent = self.require_parent_dir(path)?;
                self.put(
                    path,
                    &NodeRecord::new_file(&parent.owner_id, parent.is_public, content),
                )
            }
        }
    }

    fn rename(&self, old: &str, new: &str) -> Result<(), StorageError> {
        if !self.exists(old)? {
            return Err(StorageError::NotFound(old.to_string()));
        }
        if self.exists(new)? {
            return Err(StorageError::AlreadyExists(new.to_string()));
        }
        let renames = vec![RenamePair {
            old_path: old.to_string(),
            new_path: new.to_string(),
        }];
        let mut batch = sled::Batch::default();
        for key in self.subtree_keys(old)? {
            let value = self
                .db
                .get(key.as_bytes())?
                .ok_or_else(|| StorageError::NotFound(key.clone()))?;
            let new_key = crate::types::remap_path(&key, &renames);
            batch.remove(key.as_bytes());
            batch.insert(new_key.as_bytes(), value);
        }
        self.db.apply_batch(batch)?;
        Ok(())
    }

    fn remove(&self, path: &str, recursive: bool) -> Result<(), StorageError> {
        let record = self.record(path)?;
        if record.is_directory && !recursive && self.has_children(path)? {
            return Err(StorageError::Backend(format!("directory not empty: {}", path)));
        }
        let mut batch = sled::Batch::default();
        for key in self.subtree_keys(path)? {
            batch.remove(key.as_bytes());
        }
        self.db.apply_batch(batch)?;
        Ok(())
    }

    fn mkdir(&self, path: &str, recursive: bool) -> Result<(), StorageError> {
        if self.exists(path)? {
            return Err(StorageError::AlreadyExists(path.to_string()));
        }
        if recursive {
            let parent = crate::path::parent_of(path);
            if parent != *path && !self.exists(&parent)? {
                self.mkdir(&parent, true)?;
            }
        }
        let parent = self.require_parent_dir(path)?;
        self.put(path, &NodeRecord::new_dir(&parent.owner_id, parent.is_public))
    }

    fn has_children(&self, path: &str) -> Result<bool, StorageError> {
        let prefix = Self::child_prefix(path);
        for item in self.db.scan_prefix(prefix.as_bytes()) {
            let (key, _) = item?;
            if key.as_ref() != path.as_bytes() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn ordinal_of(&self, path: &str) -> Result<Option<Ordinal>, StorageError> {
        Ok(self.record(path)?.ordinal)
    }

    fn set_ordinal(
        &self,
        path: &str,
        ordinal: Ordinal,
    ) -> Result<Option<RenamePair>, StorageError> {
        let mut record = self.record(path)?;
        record.ordinal = Some(ordinal);
        self.put(path, &record)?;
        Ok(None)
    }

    fn atomic_ordinals(&self) -> bool {
        true
    }

    fn encodes_ordinals(&self) -> bool {
        false
    }

    fn stored_name(&self, name: &str, _ordinal: Ordinal) -> String {
        name.to_string()
    }

    /// Single atomic batch over all rows; stored paths never change.
    fn set_ordinals(&self, updates: &[(String, Ordinal)]) -> Result<RenameMap, StorageError> {
        let mut batch = sled::Batch::default();
        for (path, ordinal) in updates {
            let mut record = self.record(path)?;
            record.ordinal = Some(*ordinal);
            batch.insert(path.as_bytes(), bincode::serialize(&record)?);
        }
        self.db.apply_batch(batch)?;
        Ok(Vec::new())
    }

    fn owner_of(&self, path: &str) -> Result<String, StorageError> {
        Ok(self.record(path)?.owner_id)
    }

    fn visibility_of(&self, path: &str) -> Result<bool, StorageError> {
        Ok(self.record(path)?.is_public)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MetaStore {
        MetaStore::temporary("local").unwrap()
    }

    #[test]
    fn root_exists_on_open() {
        let store = store();
        assert!(store.exists("/").unwrap());
        assert!(store.stat("/").unwrap().is_directory);
    }

    #[test]
    fn write_and_list_children() {
        let store = store();
        store.mkdir("/docs", false).unwrap();
        store.write_file("/docs/a.md", "alpha").unwrap();
        store.write_file("/docs/b.md", "beta").unwrap();
        store.mkdir("/docs/sub", false).unwrap();
        store.write_file("/docs/sub/deep.md", "deep").unwrap();

        let mut names = store.read_dir("/docs").unwrap();
        names.sort();
        assert_eq!(names, vec!["a.md", "b.md", "sub"]);
    }

    #[test]
    fn children_inherit_access_attributes() {
        let store = store();
        store.mkdir("/team", false).unwrap();
        let mut record = store.record("/team").unwrap();
        record.owner_id = "alice".to_string();
        record.is_public = true;
        store.put("/team", &record).unwrap();

        store.write_file("/team/doc.md", "x").unwrap();
        assert_eq!(store.owner_of("/team/doc.md").unwrap(), "alice");
        assert!(store.visibility_of("/team/doc.md").unwrap());
    }

    #[test]
    fn set_ordinals_is_a_metadata_batch() {
        let store = store();
        store.write_file("/a.md", "1").unwrap();
        store.write_file("/b.md", "2").unwrap();
        let renames = store
            .set_ordinals(&[("/a.md".to_string(), 1), ("/b.md".to_string(), 0)])
            .unwrap();
        assert!(renames.is_empty());
        assert_eq!(store.ordinal_of("/a.md").unwrap(), Some(1));
        assert_eq!(store.ordinal_of("/b.md").unwrap(), Some(0));
    }

    #[test]
    fn rename_moves_subtree() {
        let store = store();
        store.mkdir("/old", false).unwrap();
        store.write_file("/old/f.md", "x").unwrap();
        store.rename("/old", "/new").unwrap();
        assert!(!store.exists("/old").unwrap());
        assert!(!store.exists("/old/f.md").unwrap());
        assert_eq!(store.read_file("/new/f.md").unwrap(), "x");
    }

    #[test]
    fn remove_requires_recursive_for_populated_dirs() {
        let store = store();
        store.mkdir("/d", false).unwrap();
        store.write_file("/d/f.md", "x").unwrap();
        assert!(store.remove("/d", false).is_err());
        store.remove("/d", true).unwrap();
        assert!(!store.exists("/d/f.md").unwrap());
    }
}
