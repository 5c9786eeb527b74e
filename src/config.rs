//! Engine configuration.
//!
//! Layered loading: explicit file, then `FOLIO_*` environment overrides,
//! then defaults. All fields carry serde defaults so partial files work.

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the tree engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Store root directory. Every resolved path must stay inside it.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Zero-pad width for name-encoded ordinal prefixes.
    #[serde(default = "default_ordinal_width")]
    pub ordinal_width: usize,

    /// Trailing marker on a folder name that triggers pullup flattening.
    #[serde(default = "default_flatten_suffix")]
    pub flatten_suffix: char,

    /// Extensions classified as text (content loaded on materialization).
    #[serde(default = "default_text_extensions")]
    pub text_extensions: Vec<String>,

    /// Extensions classified as image (relative URL only).
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,

    /// Owner assigned to nodes created without an explicit owner.
    #[serde(default = "default_owner")]
    pub default_owner: String,

    /// Separator written between parts by the join operation.
    #[serde(default = "default_join_separator")]
    pub join_separator: String,

    /// Name of the child file created by convert-to-folder when the
    /// converted file had content beyond its first line.
    #[serde(default = "default_convert_child_name")]
    pub convert_child_name: String,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_ordinal_width() -> usize {
    4
}

fn default_flatten_suffix() -> char {
    '_'
}

fn default_text_extensions() -> Vec<String> {
    ["md", "txt", "json", "html", "csv"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_image_extensions() -> Vec<String> {
    ["png", "jpg", "jpeg", "gif", "webp", "svg"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_owner() -> String {
    "local".to_string()
}

fn default_join_separator() -> String {
    "\n\n".to_string()
}

fn default_convert_child_name() -> String {
    "content.md".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            ordinal_width: default_ordinal_width(),
            flatten_suffix: default_flatten_suffix(),
            text_extensions: default_text_extensions(),
            image_extensions: default_image_extensions(),
            default_owner: default_owner(),
            join_separator: default_join_separator(),
            convert_child_name: default_convert_child_name(),
        }
    }
}

impl EngineConfig {
    /// Load configuration with precedence: file (if given), `FOLIO_*`
    /// environment variables, defaults.
    pub fn load(file: Option<&std::path::Path>) -> Result<Self, EngineError> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path.to_path_buf()));
        }
        builder = builder.add_source(config::Environment::with_prefix("FOLIO"));
        let loaded = builder
            .build()
            .map_err(|e| EngineError::Config(e.to_string()))?;
        match loaded.try_deserialize::<EngineConfig>() {
            Ok(cfg) => Ok(cfg),
            // An empty layering (no file, no env) deserializes to nothing
            // with the config crate; fall back to defaults.
            Err(_) if file.is_none() => Ok(EngineConfig::default()),
            Err(e) => Err(EngineError::Config(e.to_string())),
        }
    }

    /// Whether an extension (lowercased, no dot) classifies as text.
    pub fn is_text_extension(&self, ext: &str) -> bool {
        self.text_extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }

    /// Whether an extension (lowercased, no dot) classifies as image.
    pub fn is_image_extension(&self, ext: &str) -> bool {
        self.image_extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }
}
