//! Renderable tree node.

use crate::types::{NodeKind, Ordinal};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One materialized file or folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNode {
    /// Stored name, ordinal prefix included for name-encoded stores.
    pub name: String,

    /// Sibling sort position; ties broken by case-insensitive name.
    pub ordinal: Ordinal,

    pub is_directory: bool,
    pub kind: NodeKind,

    /// Access/visibility attributes inherited from the parent on creation.
    pub owner_id: String,
    pub is_public: bool,

    pub create_time: DateTime<Utc>,
    pub modify_time: DateTime<Utc>,

    /// Loaded lazily for text files only; never populated for directories.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Relative URL for image files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// Populated only when pullup flattening applies; `None` means no
    /// pullup occurred.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeNode>>,

    /// True when the directory is non-empty in the backing store.
    pub fs_children: bool,
}

impl TreeNode {
    /// The ordinal-free portion of the node's name.
    pub fn friendly_name(&self) -> &str {
        crate::ordinal::encoding::strip(&self.name)
    }
}
