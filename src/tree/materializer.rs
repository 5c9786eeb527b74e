//! Directory materialization.
//!
//! Read-only: lists a directory into renderable nodes, classifies entries,
//! loads text content, and optionally performs pullup flattening. A pullup
//! folder (ordinal-stripped name ending in the flatten marker) is replaced
//! in its parent's listing by its own recursively materialized contents;
//! an empty pullup folder keeps its node with `children` cleared.

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::ordinal::encoding;
use crate::storage::{EntryMeta, TreeStorage};
use crate::tree::node::TreeNode;
use crate::types::NodeKind;
use std::path::Path;
use tracing::trace;
use unicode_normalization::UnicodeNormalization;

/// Read-only tree materializer.
pub struct TreeMaterializer<'a> {
    storage: &'a dyn TreeStorage,
    config: &'a EngineConfig,
}

impl<'a> TreeMaterializer<'a> {
    pub fn new(storage: &'a dyn TreeStorage, config: &'a EngineConfig) -> Self {
        Self { storage, config }
    }

    /// Materialize a directory into an ordered node list.
    ///
    /// With `pullup` enabled, flatten-marked folders are spliced into the
    /// listing; re-entrant, so a pulled-up folder may itself contain
    /// another pullup folder.
    pub fn list(&self, path: &str, pullup: bool) -> Result<Vec<TreeNode>, EngineError> {
        let path = crate::path::normalize(path);
        crate::path::validate_segments(&path)?;
        self.list_inner(&path, pullup)
    }

    fn list_inner(&self, path: &str, pullup: bool) -> Result<Vec<TreeNode>, EngineError> {
        let mut entries: Vec<EntryMeta> = self
            .storage
            .read_dir_with_meta(path)?
            .into_iter()
            .filter(|entry| !crate::path::is_hidden(&entry.name))
            .collect();
        entries.sort_by(|a, b| {
            let ord_a = a.ordinal.unwrap_or(0);
            let ord_b = b.ordinal.unwrap_or(0);
            ord_a
                .cmp(&ord_b)
                .then_with(|| sort_key(&a.name).cmp(&sort_key(&b.name)))
        });
        trace!(path = path, entries = entries.len(), pullup = pullup, "materializing");

        let mut nodes = Vec::with_capacity(entries.len());
        for entry in entries {
            let child_path = crate::path::join(path, &entry.name);
            if entry.is_directory && pullup && self.is_pullup_name(&entry.name) {
                let pulled = self.list_inner(&child_path, true)?;
                if pulled.is_empty() {
                    // Callers rely on absence to mean "no pullup occurred".
                    nodes.push(self.directory_node(&child_path, entry, None)?);
                } else {
                    nodes.extend(pulled);
                }
                continue;
            }
            if entry.is_directory {
                nodes.push(self.directory_node(&child_path, entry, None)?);
            } else {
                nodes.push(self.file_node(&child_path, entry)?);
            }
        }
        Ok(nodes)
    }

    /// Hierarchical view: directory nodes carry their recursively
    /// materialized children. No flattening.
    pub fn subtree(&self, path: &str) -> Result<Vec<TreeNode>, EngineError> {
        let path = crate::path::normalize(path);
        crate::path::validate_segments(&path)?;
        self.subtree_inner(&path)
    }

    fn subtree_inner(&self, path: &str) -> Result<Vec<TreeNode>, EngineError> {
        let mut nodes = self.list_inner(path, false)?;
        for node in &mut nodes {
            if node.is_directory {
                let child_path = crate::path::join(path, &node.name);
                let children = self.subtree_inner(&child_path)?;
                if !children.is_empty() {
                    node.children = Some(children);
                }
            }
        }
        Ok(nodes)
    }

    fn is_pullup_name(&self, name: &str) -> bool {
        encoding::strip(name).ends_with(self.config.flatten_suffix)
    }

    fn directory_node(
        &self,
        child_path: &str,
        entry: EntryMeta,
        children: Option<Vec<TreeNode>>,
    ) -> Result<TreeNode, EngineError> {
        let fs_children = self.storage.has_children(child_path)?;
        Ok(TreeNode {
            ordinal: entry.ordinal.unwrap_or(0),
            name: entry.name,
            is_directory: true,
            kind: NodeKind::Directory,
            owner_id: entry.owner_id,
            is_public: entry.is_public,
            create_time: entry.create_time,
            modify_time: entry.modify_time,
            content: None,
            image_url: None,
            children,
            fs_children,
        })
    }

    fn file_node(&self, child_path: &str, entry: EntryMeta) -> Result<TreeNode, EngineError> {
        let kind = self.classify(&entry.name);
        let content = if kind == NodeKind::Text {
            Some(self.storage.read_file(child_path)?)
        } else {
            None
        };
        let image_url = if kind == NodeKind::Image {
            Some(child_path.trim_start_matches('/').to_string())
        } else {
            None
        };
        Ok(TreeNode {
            ordinal: entry.ordinal.unwrap_or(0),
            name: entry.name,
            is_directory: false,
            kind,
            owner_id: entry.owner_id,
            is_public: entry.is_public,
            create_time: entry.create_time,
            modify_time: entry.modify_time,
            content,
            image_url,
            children: None,
            fs_children: false,
        })
    }

    fn classify(&self, name: &str) -> NodeKind {
        let friendly = encoding::strip(name);
        match Path::new(friendly).extension().and_then(|e| e.to_str()) {
            Some(ext) if self.config.is_text_extension(ext) => NodeKind::Text,
            Some(ext) if self.config.is_image_extension(ext) => NodeKind::Image,
            _ => NodeKind::Binary,
        }
    }
}

fn sort_key(name: &str) -> String {
    encoding::strip(name).nfc().collect::<String>().to_lowercase()
}
