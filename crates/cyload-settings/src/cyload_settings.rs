//! Cyload Settings
//!
//! Persistent upload settings:
//! - Default batch size for data transactions
//! - Target database
//! - File extensions recognised as Cypher scripts

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod settings_file;

pub use settings_file::*;

/// Data statements per transaction when nothing else is configured
pub const DEFAULT_BATCH_SIZE: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadSettings {
    pub default_batch_size: usize,
    /// Target database, or the server default when unset
    pub database: Option<String>,
    /// Extensions including the leading dot, compared case-insensitively
    pub accepted_extensions: Vec<String>,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            default_batch_size: DEFAULT_BATCH_SIZE,
            database: None,
            accepted_extensions: vec![".cypher".into(), ".cql".into(), ".txt".into()],
        }
    }
}

impl UploadSettings {
    /// Load from the platform config directory, falling back to defaults
    /// when no file exists yet
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::settings_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {:?}", path))?;
        serde_json::from_str(&content).with_context(|| "Failed to parse settings JSON")
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::settings_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write settings to {:?}", path))?;
        Ok(())
    }

    pub fn settings_path() -> Result<PathBuf> {
        settings_file()
    }

    /// Configured batch size, never zero
    pub fn normalized_batch_size(&self) -> usize {
        self.default_batch_size.max(1)
    }

    /// Whether `file_name` ends with one of the accepted extensions
    pub fn accepts_file(&self, file_name: &str) -> bool {
        let lower = file_name.to_lowercase();
        self.accepted_extensions
            .iter()
            .any(|ext| lower.ends_with(&ext.to_lowercase()))
    }
}
