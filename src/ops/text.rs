//! Text-shaped mutations: join, split, and convert-file-to-folder.

use super::{is_text_name, map_conflict, MutationService, NewEntry};
use crate::error::EngineError;
use crate::ordinal::shift_down;
use crate::types::Ordinal;
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Result of a join.
#[derive(Debug, Clone, Serialize)]
pub struct JoinOutcome {
    pub file_name: String,
}

/// Result of a split.
#[derive(Debug, Clone, Serialize)]
pub struct SplitOutcome {
    pub file_name: String,
    pub created: Vec<String>,
}

/// Result of a convert-to-folder.
#[derive(Debug, Clone, Serialize)]
pub struct ConvertOutcome {
    pub folder_name: String,
}

impl MutationService {
    /// Concatenate two or more text files in ordinal order into the
    /// lowest-ordinal file, separated by the configured join separator,
    /// and delete the rest.
    pub fn join(&self, parent: &str, names: &[String]) -> Result<JoinOutcome, EngineError> {
        let parent = self.prepare_parent(parent)?;
        let lock = self.locks().get_lock(&parent);
        let _guard = lock.write();

        if names.len() < 2 {
            return Err(EngineError::InvalidOperation(
                "join requires at least 2 files".to_string(),
            ));
        }
        let mut items: Vec<(String, Ordinal, String)> = Vec::with_capacity(names.len());
        for name in names {
            let path = crate::path::join(&parent, name);
            if !self.storage().exists(&path)? {
                return Err(EngineError::NotFound(path));
            }
            if self.storage().stat(&path)?.is_directory || !is_text_name(self.config(), name) {
                return Err(EngineError::InvalidOperation(format!(
                    "join selection must be text files: {}",
                    name
                )));
            }
            let ordinal = self.storage().ordinal_of(&path)?.unwrap_or(0);
            items.push((name.clone(), ordinal, self.storage().read_file(&path)?));
        }
        items.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

        let combined = items
            .iter()
            .map(|(_, _, content)| content.as_str())
            .collect::<Vec<_>>()
            .join(&self.config().join_separator);

        let (first_name, _, _) = &items[0];
        let first_path = crate::path::join(&parent, first_name);
        self.storage().write_file(&first_path, &combined)?;
        for (name, _, _) in &items[1..] {
            self.storage()
                .remove(&crate::path::join(&parent, name), false)?;
        }
        info!(
            parent = parent.as_str(),
            into = first_name.as_str(),
            joined = items.len(),
            "joined files"
        );
        Ok(JoinOutcome {
            file_name: first_name.clone(),
        })
    }

    /// Split a text file at a delimiter. Part 0 stays in the original
    /// file; each remaining part becomes a new file at the next sequential
    /// ordinal, with siblings shifted down to make room.
    pub fn split(
        &self,
        parent: &str,
        name: &str,
        delimiter: &str,
    ) -> Result<SplitOutcome, EngineError> {
        let parent = self.prepare_parent(parent)?;
        let lock = self.locks().get_lock(&parent);
        let _guard = lock.write();

        if delimiter.is_empty() {
            return Err(EngineError::InvalidOperation("empty split delimiter".to_string()));
        }
        let path = crate::path::join(&parent, name);
        if !self.storage().exists(&path)? {
            return Err(EngineError::NotFound(path));
        }
        if self.storage().stat(&path)?.is_directory || !is_text_name(self.config(), name) {
            return Err(EngineError::InvalidOperation(format!(
                "split target must be a text file: {}",
                name
            )));
        }
        let content = self.storage().read_file(&path)?;
        let parts: Vec<&str> = content.split(delimiter).collect();
        if parts.len() < 2 {
            return Err(EngineError::InvalidOperation(
                "delimiter not found in file".to_string(),
            ));
        }

        let ordinal = self.storage().ordinal_of(&path)?.unwrap_or(0);
        shift_down(self.storage(), &parent, ordinal + 1, (parts.len() - 1) as u32)?;

        let mut created = Vec::with_capacity(parts.len() - 1);
        for (index, part) in parts.iter().enumerate().skip(1) {
            let part_name = derived_part_name(self.storage().base_name(name), index);
            let stored = self.place_new(
                &parent,
                &part_name,
                ordinal + index as Ordinal,
                NewEntry::File(*part),
            )?;
            created.push(stored);
        }
        // Truncate the original last; a failure anywhere earlier leaves
        // every part of the content still on disk.
        self.storage().write_file(&path, parts[0])?;
        info!(
            parent = parent.as_str(),
            file = name,
            parts = parts.len(),
            "split file"
        );
        Ok(SplitOutcome {
            file_name: name.to_string(),
            created,
        })
    }

    /// Convert a text file into a folder named after its first content
    /// line. The folder inherits the file's ordinal; remaining content
    /// becomes a single child file at ordinal 0.
    pub fn convert_to_folder(
        &self,
        parent: &str,
        name: &str,
    ) -> Result<ConvertOutcome, EngineError> {
        let parent = self.prepare_parent(parent)?;
        let lock = self.locks().get_lock(&parent);
        let _guard = lock.write();

        let path = crate::path::join(&parent, name);
        if !self.storage().exists(&path)? {
            return Err(EngineError::NotFound(path));
        }
        if self.storage().stat(&path)?.is_directory || !is_text_name(self.config(), name) {
            return Err(EngineError::InvalidOperation(format!(
                "convert target must be a text file: {}",
                name
            )));
        }
        let content = self.storage().read_file(&path)?;
        let first_line = content.lines().next().unwrap_or("");
        let folder_name = sanitize_folder_name(first_line);
        if folder_name.is_empty() {
            return Err(EngineError::InvalidOperation(
                "first line yields no folder name".to_string(),
            ));
        }
        let remaining = content
            .split_once('\n')
            .map(|(_, rest)| rest.trim_start_matches('\n'))
            .unwrap_or("");

        let ordinal = self.storage().ordinal_of(&path)?.unwrap_or(0);

        // Build the folder under a hidden staging name so a failure part
        // way through never loses the file's content or exposes a
        // half-built folder.
        let staging = crate::path::join(&parent, &crate::path::staging_name(&path));
        self.storage().mkdir(&staging, false)?;
        if !remaining.trim().is_empty() {
            let child_stored = self
                .storage()
                .stored_name(&self.config().convert_child_name, 0);
            let child_path = crate::path::join(&staging, &child_stored);
            self.storage().write_file(&child_path, remaining)?;
        }

        self.storage().remove(&path, false)?;
        let folder_stored = self.storage().stored_name(&folder_name, ordinal);
        let folder_path = crate::path::join(&parent, &folder_stored);
        self.storage()
            .rename(&staging, &folder_path)
            .map_err(map_conflict)?;
        if !self.storage().encodes_ordinals() {
            self.storage().set_ordinal(&folder_path, ordinal)?;
            if !remaining.trim().is_empty() {
                let child_path =
                    crate::path::join(&folder_path, &self.config().convert_child_name);
                self.storage().set_ordinal(&child_path, 0)?;
            }
        }
        info!(
            parent = parent.as_str(),
            file = name,
            folder = folder_stored.as_str(),
            "converted file to folder"
        );
        Ok(ConvertOutcome {
            folder_name: folder_stored,
        })
    }
}

/// Name for part `index` of a split: `chapter.md` yields `chapter-1.md`.
fn derived_part_name(friendly: &str, index: usize) -> String {
    let path = Path::new(friendly);
    match (
        path.file_stem().and_then(|s| s.to_str()),
        path.extension().and_then(|e| e.to_str()),
    ) {
        (Some(stem), Some(ext)) => format!("{}-{}.{}", stem, index, ext),
        _ => format!("{}-{}", friendly, index),
    }
}

/// Folder name from a first line: heading markers stripped, separators
/// replaced, whitespace trimmed.
fn sanitize_folder_name(line: &str) -> String {
    line.trim_start_matches('#')
        .trim()
        .replace(['/', '\\'], "-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::error::StorageError;
    use crate::ordinal::assigned_siblings;
    use crate::storage::{FsStore, MetaStore, StatInfo, TreeStorage};
    use crate::types::RenamePair;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn service() -> (TempDir, MutationService) {
        let dir = TempDir::new().unwrap();
        let store = FsStore::open(dir.path(), 4, "local").unwrap();
        let service = MutationService::new(Arc::new(store), EngineConfig::default());
        (dir, service)
    }

    fn order(service: &MutationService, parent: &str) -> Vec<(String, u32)> {
        assigned_siblings(service.storage(), parent).unwrap()
    }

    #[test]
    fn join_concatenates_in_ordinal_order() {
        let (_dir, service) = service();
        service.create_file("/", "second.md", "beta", None).unwrap();
        service.create_file("/", "first.md", "alpha", None).unwrap();
        let outcome = service
            .join(
                "/",
                &["0001_second.md".to_string(), "0000_first.md".to_string()],
            )
            .unwrap();
        assert_eq!(outcome.file_name, "0000_first.md");
        assert_eq!(
            service.storage().read_file("/0000_first.md").unwrap(),
            "alpha\n\nbeta"
        );
        assert!(!service.storage().exists("/0001_second.md").unwrap());
    }

    #[test]
    fn join_rejects_single_file_and_non_text() {
        let (_dir, service) = service();
        service.create_file("/", "a.md", "a", None).unwrap();
        assert!(matches!(
            service.join("/", &["0000_a.md".to_string()]),
            Err(EngineError::InvalidOperation(_))
        ));

        service.create_file("/", "img.png", "raw", None).unwrap();
        assert!(matches!(
            service.join(
                "/",
                &["0000_img.png".to_string(), "0001_a.md".to_string()]
            ),
            Err(EngineError::InvalidOperation(_))
        ));
    }

    #[test]
    fn split_is_the_inverse_of_join() {
        let (_dir, service) = service();
        service.create_file("/", "b.md", "part two", None).unwrap();
        service.create_file("/", "a.md", "part one", None).unwrap();
        service
            .join("/", &["0000_a.md".to_string(), "0001_b.md".to_string()])
            .unwrap();

        let outcome = service.split("/", "0000_a.md", "\n\n").unwrap();
        assert_eq!(outcome.created, vec!["0001_a-1.md".to_string()]);
        assert_eq!(
            service.storage().read_file("/0000_a.md").unwrap(),
            "part one"
        );
        assert_eq!(
            service.storage().read_file("/0001_a-1.md").unwrap(),
            "part two"
        );
    }

    #[test]
    fn split_shifts_following_siblings() {
        let (_dir, service) = service();
        service.create_file("/", "tail.md", "t", None).unwrap();
        service
            .create_file("/", "doc.md", "one|two|three", None)
            .unwrap();
        // [doc(0), tail(1)]
        service.split("/", "0000_doc.md", "|").unwrap();
        assert_eq!(
            order(&service, "/"),
            vec![
                ("0000_doc.md".to_string(), 0),
                ("0001_doc-1.md".to_string(), 1),
                ("0002_doc-2.md".to_string(), 2),
                ("0003_tail.md".to_string(), 3),
            ]
        );
    }

    /// Delegating store that refuses writes to one configured path, for
    /// exercising mid-sequence failures.
    struct RefusingStore {
        inner: FsStore,
        refuse: Mutex<Option<String>>,
    }

    impl TreeStorage for RefusingStore {
        fn exists(&self, path: &str) -> Result<bool, StorageError> {
            self.inner.exists(path)
        }
        fn stat(&self, path: &str) -> Result<StatInfo, StorageError> {
            self.inner.stat(path)
        }
        fn read_dir(&self, path: &str) -> Result<Vec<String>, StorageError> {
            self.inner.read_dir(path)
        }
        fn read_file(&self, path: &str) -> Result<String, StorageError> {
            self.inner.read_file(path)
        }
        fn write_file(&self, path: &str, content: &str) -> Result<(), StorageError> {
            if self.refuse.lock().as_deref() == Some(path) {
                return Err(StorageError::Backend(format!("write refused: {}", path)));
            }
            self.inner.write_file(path, content)
        }
        fn rename(&self, old: &str, new: &str) -> Result<(), StorageError> {
            self.inner.rename(old, new)
        }
        fn remove(&self, path: &str, recursive: bool) -> Result<(), StorageError> {
            self.inner.remove(path, recursive)
        }
        fn mkdir(&self, path: &str, recursive: bool) -> Result<(), StorageError> {
            self.inner.mkdir(path, recursive)
        }
        fn has_children(&self, path: &str) -> Result<bool, StorageError> {
            self.inner.has_children(path)
        }
        fn ordinal_of(&self, path: &str) -> Result<Option<Ordinal>, StorageError> {
            self.inner.ordinal_of(path)
        }
        fn set_ordinal(
            &self,
            path: &str,
            ordinal: Ordinal,
        ) -> Result<Option<RenamePair>, StorageError> {
            self.inner.set_ordinal(path, ordinal)
        }
        fn atomic_ordinals(&self) -> bool {
            self.inner.atomic_ordinals()
        }
        fn encodes_ordinals(&self) -> bool {
            self.inner.encodes_ordinals()
        }
        fn stored_name(&self, name: &str, ordinal: Ordinal) -> String {
            self.inner.stored_name(name, ordinal)
        }
        fn owner_of(&self, path: &str) -> Result<String, StorageError> {
            self.inner.owner_of(path)
        }
        fn visibility_of(&self, path: &str) -> Result<bool, StorageError> {
            self.inner.visibility_of(path)
        }
    }

    #[test]
    fn split_keeps_content_when_final_write_fails() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(RefusingStore {
            inner: FsStore::open(dir.path(), 4, "local").unwrap(),
            refuse: Mutex::new(None),
        });
        let service = MutationService::new(store.clone(), EngineConfig::default());
        service.create_file("/", "doc.md", "head|tail", None).unwrap();

        *store.refuse.lock() = Some("/0000_doc.md".to_string());
        assert!(service.split("/", "0000_doc.md", "|").is_err());

        // The truncation of the original comes last, so nothing was lost:
        // the full content is still there and the tail part is on disk.
        assert_eq!(
            service.storage().read_file("/0000_doc.md").unwrap(),
            "head|tail"
        );
        assert_eq!(
            service.storage().read_file("/0001_doc-1.md").unwrap(),
            "tail"
        );
    }

    #[test]
    fn metadata_store_split_keeps_name_verbatim_in_parts() {
        let store = MetaStore::temporary("local").unwrap();
        let service = MutationService::new(Arc::new(store), EngineConfig::default());
        service.create_file("/", "12_notes.md", "a|b", None).unwrap();
        // The digit prefix is part of the user's name here and carries
        // into the derived part names.
        let outcome = service.split("/", "12_notes.md", "|").unwrap();
        assert_eq!(outcome.created, vec!["12_notes-1.md".to_string()]);
        assert_eq!(
            service.storage().read_file("/12_notes-1.md").unwrap(),
            "b"
        );
    }

    #[test]
    fn split_without_delimiter_match_is_invalid() {
        let (_dir, service) = service();
        service.create_file("/", "a.md", "no breaks here", None).unwrap();
        assert!(matches!(
            service.split("/", "0000_a.md", "\n\n"),
            Err(EngineError::InvalidOperation(_))
        ));
    }

    #[test]
    fn convert_preserves_ordinal_and_creates_child() {
        let (_dir, service) = service();
        service.create_file("/", "after.md", "x", None).unwrap();
        service
            .create_file("/", "plan.md", "# Big Plan\n\ndetails here", None)
            .unwrap();
        // [plan(0), after(1)]
        let outcome = service.convert_to_folder("/", "0000_plan.md").unwrap();
        assert_eq!(outcome.folder_name, "0000_Big Plan");
        assert!(service.storage().stat("/0000_Big Plan").unwrap().is_directory);
        assert!(!service.storage().exists("/0000_plan.md").unwrap());
        assert_eq!(
            service
                .storage()
                .read_file("/0000_Big Plan/0000_content.md")
                .unwrap(),
            "details here"
        );
        // Sibling untouched.
        assert!(service.storage().exists("/0001_after.md").unwrap());
    }

    #[test]
    fn convert_without_remaining_content_creates_no_child() {
        let (_dir, service) = service();
        service.create_file("/", "title.md", "Just A Title\n", None).unwrap();
        service.convert_to_folder("/", "0000_title.md").unwrap();
        assert!(service
            .storage()
            .stat("/0000_Just A Title")
            .unwrap()
            .is_directory);
        assert!(!service
            .storage()
            .has_children("/0000_Just A Title")
            .unwrap());
    }

    #[test]
    fn convert_rejects_empty_first_line() {
        let (_dir, service) = service();
        service.create_file("/", "empty.md", "\nbody", None).unwrap();
        assert!(matches!(
            service.convert_to_folder("/", "0000_empty.md"),
            Err(EngineError::InvalidOperation(_))
        ));
    }

    #[test]
    fn derived_part_names_keep_extensions() {
        assert_eq!(derived_part_name("chapter.md", 1), "chapter-1.md");
        assert_eq!(derived_part_name("raw", 2), "raw-2");
    }
}
