//! Durable local store configuration

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::adapters::FileLocalStore;

/// Durable local store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory the file store writes cache entries into
    #[serde(default = "default_dir")]
    pub dir: PathBuf,
}

impl StorageConfig {
    /// The configured directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Builds the file store adapter
    pub fn file_store(&self) -> FileLocalStore {
        FileLocalStore::new(&self.dir)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { dir: default_dir() }
    }
}

fn default_dir() -> PathBuf {
    PathBuf::from(".nestquest/cache")
}
