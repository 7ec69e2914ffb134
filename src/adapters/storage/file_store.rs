//! File-based Local Store Adapter
//!
//! Stores each cache entry as a JSON file under a base directory, one file
//! per key. Writes go through a temp-file rename so a reader always sees the
//! old or the new value, never a torn write.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::ports::{LocalStore, LocalStoreError};

/// Durable string key/value storage on the local filesystem.
#[derive(Debug, Clone)]
pub struct FileLocalStore {
    base_path: PathBuf,
}

impl FileLocalStore {
    /// Create a file store rooted at a base directory.
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    /// Path of the file backing a key.
    fn entry_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", encode_key(key)))
    }

    async fn ensure_dir(&self) -> Result<(), LocalStoreError> {
        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| LocalStoreError::Io(e.to_string()))
    }
}

/// Encodes a key into a filename-safe form, reversibly: alphanumerics,
/// `-`, `_` and `.` pass through, everything else becomes `%XX`.
fn encode_key(key: &str) -> String {
    let mut encoded = String::with_capacity(key.len());
    for byte in key.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' => {
                encoded.push(byte as char)
            }
            other => encoded.push_str(&format!("%{:02X}", other)),
        }
    }
    encoded
}

#[async_trait]
impl LocalStore for FileLocalStore {
    async fn get(&self, key: &str) -> Result<Option<String>, LocalStoreError> {
        match fs::read_to_string(self.entry_path(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(LocalStoreError::Io(e.to_string())),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<(), LocalStoreError> {
        self.ensure_dir().await?;

        let path = self.entry_path(key);
        let tmp = path.with_extension("json.tmp");

        fs::write(&tmp, value)
            .await
            .map_err(|e| LocalStoreError::Io(e.to_string()))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| LocalStoreError::Io(e.to_string()))
    }

    async fn remove(&self, key: &str) -> Result<(), LocalStoreError> {
        match fs::remove_file(self.entry_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(LocalStoreError::Io(e.to_string())),
        }
    }
}
