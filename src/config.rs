//! Configuration file support.

use crate::index::SqliteIndex;
use crate::query::SnippetStyle;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Application configuration loaded from config file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Location of the index database
    pub index_path: Option<PathBuf>,

    /// Markers used to highlight snippets
    pub snippet: SnippetStyle,
}

impl Config {
    /// Load configuration from the default config file location.
    ///
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `config_path`, or defaults if it doesn't exist.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("failed to read config file: {}", config_path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", config_path.display()))
    }

    /// Returns the path to the config file.
    ///
    /// Default: `~/.config/notegraph/config.toml`
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("notegraph")
            .join("config.toml")
    }

    /// Resolve the index database path.
    ///
    /// Precedence order:
    /// 1. Config file `index_path` setting
    /// 2. `.index/notes.db` inside the notes directory
    pub fn index_path(&self, notes_dir: &Path) -> PathBuf {
        self.index_path
            .clone()
            .unwrap_or_else(|| notes_dir.join(".index").join("notes.db"))
    }

    /// Opens the index for `notes_dir` with the configured snippet style.
    pub fn open_index(&self, notes_dir: &Path) -> Result<SqliteIndex> {
        let path = self.index_path(notes_dir);
        let mut index = SqliteIndex::open(&path)
            .with_context(|| format!("failed to open index: {}", path.display()))?;
        index.set_snippet_style(self.snippet.clone());
        Ok(index)
    }
}
