//! CLI Tooling
//!
//! Command-line interface over the tree engine. Commands accept stored or
//! friendly paths interchangeably; every path is resolved against the
//! store before the operation runs.

use crate::config::EngineConfig;
use crate::error::{EngineError, StorageError};
use crate::logging::LoggingConfig;
use crate::ops::MutationService;
use crate::ordinal::encoding;
use crate::path::resolve::resolve_friendly_path;
use crate::storage::boundary::canonical_root;
use crate::storage::FsStore;
use crate::tree::validate::duplicate_ordinals;
use crate::tree::{TreeMaterializer, TreeNode};
use crate::types::NodeKind;
use clap::{Parser, Subcommand};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::sync::Arc;

/// Folio CLI - Ordinal-ordered hierarchical document store
#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Ordinal-ordered hierarchical document store")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Store root directory (overrides the configured root)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Configuration file path
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Logging configuration assembled from the global flags.
    pub fn logging_config(&self) -> LoggingConfig {
        let mut config = LoggingConfig::default();
        if let Some(level) = &self.log_level {
            config.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            config.output = output.clone();
        }
        if let Some(file) = &self.log_file {
            config.file = Some(file.clone());
        }
        config
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// List a directory in display order
    List {
        /// Directory path (stored or friendly)
        #[arg(default_value = "/")]
        path: String,
        /// Disable pullup flattening
        #[arg(long)]
        no_pullup: bool,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show the nested tree under a directory
    Tree {
        #[arg(default_value = "/")]
        path: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Create a text file at the top of a directory
    Create {
        parent: String,
        name: String,
        /// Initial content
        #[arg(long, default_value = "")]
        content: String,
        /// Insert after this sibling instead of at the top
        #[arg(long)]
        after: Option<String>,
    },
    /// Create a folder
    Mkdir {
        parent: String,
        name: String,
        /// Insert after this sibling instead of at the top
        #[arg(long)]
        after: Option<String>,
    },
    /// Rename an entry, keeping its position
    Rename {
        parent: String,
        name: String,
        new_name: String,
    },
    /// Delete entries (siblings keep their ordinals)
    Rm {
        parent: String,
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Swap an entry with its previous sibling
    Up { parent: String, name: String },
    /// Swap an entry with its next sibling
    Down { parent: String, name: String },
    /// Move entries between or within directories
    Paste {
        /// Source directory
        #[arg(long)]
        from: String,
        /// Target directory
        #[arg(long)]
        to: String,
        /// Insert after this sibling in the target
        #[arg(long)]
        after: Option<String>,
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Join text files into the lowest-ordinal one
    Join {
        parent: String,
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Split a text file at a delimiter
    Split {
        parent: String,
        name: String,
        /// Delimiter (defaults to the configured join separator)
        #[arg(long)]
        delimiter: Option<String>,
    },
    /// Convert a text file into a folder named after its first line
    Convert { parent: String, name: String },
    /// Scan the store for duplicate sibling ordinals
    Check {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

/// CLI context holding the opened store and its mutation service.
pub struct CliContext {
    service: MutationService,
    root: PathBuf,
}

impl CliContext {
    /// Open the store described by the config file and flag overrides.
    pub fn new(root: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<Self, EngineError> {
        let mut config = EngineConfig::load(config_path.as_deref())?;
        if let Some(root) = root {
            config.root = root;
        }
        let store = FsStore::open(&config.root, config.ordinal_width, &config.default_owner)?;
        let root = canonical_root(&config.root)?;
        Ok(Self {
            service: MutationService::new(Arc::new(store), config),
            root,
        })
    }

    pub fn service(&self) -> &MutationService {
        &self.service
    }

    /// Execute a command, producing its printable output.
    pub fn execute(&self, command: &Commands) -> Result<String, EngineError> {
        match command {
            Commands::List {
                path,
                no_pullup,
                format,
            } => {
                let dir = self.resolve_dir(path)?;
                let lock = self.service.locks().get_lock(&dir);
                let _guard = lock.read();
                let materializer =
                    TreeMaterializer::new(self.service.storage(), self.service.config());
                let nodes = materializer.list(&dir, !no_pullup)?;
                if format == "json" {
                    to_json(&nodes)
                } else {
                    Ok(format_listing(&dir, &nodes))
                }
            }
            Commands::Tree { path, format } => {
                let dir = self.resolve_dir(path)?;
                let lock = self.service.locks().get_lock(&dir);
                let _guard = lock.read();
                let materializer =
                    TreeMaterializer::new(self.service.storage(), self.service.config());
                let nodes = materializer.subtree(&dir)?;
                if format == "json" {
                    to_json(&nodes)
                } else {
                    let mut out = format!("{}\n", dir.bold());
                    render_tree(&nodes, 1, &mut out);
                    Ok(out)
                }
            }
            Commands::Create {
                parent,
                name,
                content,
                after,
            } => {
                let parent = self.resolve_dir(parent)?;
                let after = self.resolve_anchor(&parent, after.as_deref())?;
                let outcome = self
                    .service
                    .create_file(&parent, name, content, after.as_deref())?;
                Ok(format!("Created {}", outcome.file_name))
            }
            Commands::Mkdir {
                parent,
                name,
                after,
            } => {
                let parent = self.resolve_dir(parent)?;
                let after = self.resolve_anchor(&parent, after.as_deref())?;
                let outcome = self.service.create_folder(&parent, name, after.as_deref())?;
                Ok(format!("Created {}", outcome.folder_name))
            }
            Commands::Rename {
                parent,
                name,
                new_name,
            } => {
                let parent = self.resolve_dir(parent)?;
                let name = self.resolve_name(&parent, name)?;
                let outcome = self.service.rename(&parent, &name, new_name)?;
                Ok(format!("Renamed {} to {}", outcome.old_name, outcome.new_name))
            }
            Commands::Rm { parent, names } => {
                let parent = self.resolve_dir(parent)?;
                let names = self.resolve_names(&parent, names)?;
                let outcome = self.service.delete(&parent, &names)?;
                Ok(format!("Deleted {} entries", outcome.removed.len()))
            }
            Commands::Up { parent, name } => {
                let parent = self.resolve_dir(parent)?;
                let name = self.resolve_name(&parent, name)?;
                let outcome = self.service.move_up(&parent, &name)?;
                Ok(format!(
                    "Moved {} up",
                    crate::path::leaf_of(&outcome.moved_a.new_path)
                ))
            }
            Commands::Down { parent, name } => {
                let parent = self.resolve_dir(parent)?;
                let name = self.resolve_name(&parent, name)?;
                let outcome = self.service.move_down(&parent, &name)?;
                Ok(format!(
                    "Moved {} down",
                    crate::path::leaf_of(&outcome.moved_a.new_path)
                ))
            }
            Commands::Paste {
                from,
                to,
                after,
                names,
            } => {
                let source = self.resolve_dir(from)?;
                let target = self.resolve_dir(to)?;
                let names = self.resolve_names(&source, names)?;
                let after = self.resolve_anchor(&target, after.as_deref())?;
                let outcome = self
                    .service
                    .paste(&source, &names, &target, after.as_deref())?;
                Ok(format!("Moved {} entries into {}", outcome.moved.len(), target))
            }
            Commands::Join { parent, names } => {
                let parent = self.resolve_dir(parent)?;
                let names = self.resolve_names(&parent, names)?;
                let outcome = self.service.join(&parent, &names)?;
                Ok(format!("Joined {} files into {}", names.len(), outcome.file_name))
            }
            Commands::Split {
                parent,
                name,
                delimiter,
            } => {
                let parent = self.resolve_dir(parent)?;
                let name = self.resolve_name(&parent, name)?;
                let delimiter = delimiter
                    .clone()
                    .unwrap_or_else(|| self.service.config().join_separator.clone());
                let outcome = self.service.split(&parent, &name, &delimiter)?;
                let mut out = format!("Split {} into {} parts:\n", name, outcome.created.len() + 1);
                out.push_str(&format!("  {}\n", outcome.file_name));
                for created in &outcome.created {
                    out.push_str(&format!("  {}\n", created));
                }
                Ok(out)
            }
            Commands::Convert { parent, name } => {
                let parent = self.resolve_dir(parent)?;
                let name = self.resolve_name(&parent, name)?;
                let outcome = self.service.convert_to_folder(&parent, &name)?;
                Ok(format!("Converted {} to folder {}", name, outcome.folder_name))
            }
            Commands::Check { format } => {
                let violations = duplicate_ordinals(&self.root)?;
                if format == "json" {
                    return to_json(&violations);
                }
                if violations.is_empty() {
                    return Ok(format!("{}", "No duplicate ordinals found.".green()));
                }
                let mut out = format!(
                    "{}\n\n",
                    format!("{} duplicate ordinal group(s) found", violations.len()).red()
                );
                let mut table = Table::new();
                table.load_preset(UTF8_BORDERS_ONLY);
                table.set_header(vec!["Directory", "Ordinal", "Entries"]);
                for violation in &violations {
                    table.add_row(vec![
                        violation.directory.clone(),
                        violation.ordinal.to_string(),
                        violation.names.join(", "),
                    ]);
                }
                out.push_str(&format!("{}\n", table));
                Ok(out)
            }
        }
    }

    /// Resolve a directory path, accepting stored or friendly segments.
    fn resolve_dir(&self, path: &str) -> Result<String, EngineError> {
        match resolve_friendly_path(self.service.storage(), path)? {
            Some(stored) => Ok(stored),
            None => Err(EngineError::NotFound(crate::path::normalize(path))),
        }
    }

    /// Resolve one name inside an already resolved parent to its stored name.
    fn resolve_name(&self, parent: &str, name: &str) -> Result<String, EngineError> {
        let full = crate::path::join(parent, name);
        match resolve_friendly_path(self.service.storage(), &full)? {
            Some(stored) => Ok(crate::path::leaf_of(&stored).to_string()),
            None => Err(EngineError::NotFound(full)),
        }
    }

    fn resolve_names(
        &self,
        parent: &str,
        names: &[String],
    ) -> Result<Vec<String>, EngineError> {
        names
            .iter()
            .map(|name| self.resolve_name(parent, name))
            .collect()
    }

    fn resolve_anchor(
        &self,
        parent: &str,
        anchor: Option<&str>,
    ) -> Result<Option<String>, EngineError> {
        anchor
            .map(|name| self.resolve_name(parent, name))
            .transpose()
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, EngineError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| EngineError::Storage(StorageError::Serialization(e.to_string())))
}

fn kind_label(kind: &NodeKind) -> &'static str {
    match kind {
        NodeKind::Directory => "dir",
        NodeKind::Text => "text",
        NodeKind::Image => "image",
        NodeKind::Binary => "binary",
    }
}

/// Format a directory listing as a table.
fn format_listing(dir: &str, nodes: &[TreeNode]) -> String {
    let mut out = format!("{}\n\n", dir.bold());
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Ord", "Name", "Kind", "Modified"]);
    for node in nodes {
        table.add_row(vec![
            node.ordinal.to_string(),
            node.name.clone(),
            kind_label(&node.kind).to_string(),
            node.modify_time.format("%Y-%m-%d %H:%M").to_string(),
        ]);
    }
    out.push_str(&format!("{}\n", table));
    out
}

fn render_tree(nodes: &[TreeNode], depth: usize, out: &mut String) {
    for node in nodes {
        let indent = "  ".repeat(depth);
        let friendly = encoding::strip(&node.name);
        if node.is_directory {
            out.push_str(&format!("{}{}/\n", indent, friendly.bold()));
        } else {
            out.push_str(&format!("{}{}\n", indent, friendly));
        }
        if let Some(children) = &node.children {
            render_tree(children, depth + 1, out);
        }
    }
}
