//! Store connection configs.
//!
//! A config is a small TOML file:
//!
//! ```toml
//! name = "harvested"
//! kind = "jsonl"        # or "memory"
//! path = "data/harvested.jsonl"
//! ```
//!
//! `KEY=VALUE` overrides are applied on top of the file (or stand alone when
//! no file is given). Relative paths in a file resolve against the file's
//! directory; relative paths in overrides resolve against the working
//! directory.

use rekey_graph::{GraphStore, MemoryGraph, StoreError, read_statements_from_path};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read store config {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed to parse store config {path}: {message}")]
    Parse { path: String, message: String },

    #[error("invalid override `{0}`: expected KEY=VALUE")]
    MalformedOverride(String),

    #[error("unknown store config key `{0}` (expected name, kind, or path)")]
    UnknownKey(String),

    #[error("unknown store kind `{0}` (expected jsonl or memory)")]
    UnknownKind(String),

    #[error("store `{name}` of kind jsonl requires a path")]
    MissingPath { name: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// JSONL file, locked while open and rewritten on flush.
    #[default]
    Jsonl,
    /// In-memory graph, optionally seeded read-only from a JSONL file.
    Memory,
}

impl StoreKind {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim() {
            "jsonl" => Ok(Self::Jsonl),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::UnknownKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub kind: StoreKind,
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl StoreConfig {
    /// Load `config_path` (if any) and apply `overrides`.
    ///
    /// Returns `None` when neither a file nor an override was supplied.
    pub fn resolve(
        config_path: Option<&str>,
        overrides: &[String],
    ) -> Result<Option<Self>, ConfigError> {
        let mut config = match config_path {
            Some(path) => Self::from_file(Path::new(path))?,
            None if overrides.is_empty() => return Ok(None),
            None => Self::default(),
        };
        for item in overrides {
            config.apply_override(item)?;
        }
        Ok(Some(config))
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let mut config: StoreConfig = toml::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if let Some(store_path) = config.path.as_ref()
            && store_path.is_relative()
            && let Some(parent) = path.parent()
        {
            config.path = Some(parent.join(store_path));
        }
        Ok(config)
    }

    pub fn apply_override(&mut self, item: &str) -> Result<(), ConfigError> {
        let (key, value) = item
            .split_once('=')
            .ok_or_else(|| ConfigError::MalformedOverride(item.to_string()))?;
        match key.trim() {
            "name" => self.name = Some(value.to_string()),
            "kind" => self.kind = StoreKind::parse(value)?,
            "path" => self.path = Some(PathBuf::from(value)),
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
        Ok(())
    }

    /// Display name, defaulting to `role`.
    pub fn name_or<'a>(&'a self, role: &'a str) -> &'a str {
        self.name.as_deref().unwrap_or(role)
    }

    /// Whether both configs name the same JSONL file.
    pub fn same_file_as(&self, other: &StoreConfig) -> bool {
        if self.kind != StoreKind::Jsonl || other.kind != StoreKind::Jsonl {
            return false;
        }
        match (&self.path, &other.path) {
            (Some(a), Some(b)) => canonical(a) == canonical(b),
            _ => false,
        }
    }

    pub fn open(&self, role: &str) -> Result<MemoryGraph, ConfigError> {
        let name = self.name_or(role).to_string();
        match self.kind {
            StoreKind::Jsonl => {
                let path = self
                    .path
                    .as_ref()
                    .ok_or_else(|| ConfigError::MissingPath { name: name.clone() })?;
                Ok(MemoryGraph::open_jsonl(name, path)?)
            }
            StoreKind::Memory => {
                let graph = MemoryGraph::in_memory(name.clone());
                if let Some(path) = &self.path {
                    let statements = read_statements_from_path(path).map_err(|source| {
                        StoreError::Persist {
                            store: name.clone(),
                            source,
                        }
                    })?;
                    graph.load_statements(statements)?;
                }
                tracing::debug!(store = %name, statements = graph.len()?, "opened memory graph");
                Ok(graph)
            }
        }
    }
}

fn canonical(path: &Path) -> PathBuf {
    // The file may not exist yet; fall back to the path as given.
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
