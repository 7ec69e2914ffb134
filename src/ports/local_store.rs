//! Local store port - durable, user-scoped key/value persistence.
//!
//! Backs the answer cache, the answered-question order, and the pending
//! submission queue. No transactional guarantees are assumed beyond
//! single-key atomicity.

use async_trait::async_trait;

use crate::domain::foundation::EngineError;

/// Errors that can occur during local store operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LocalStoreError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("corrupt entry for key '{key}': {reason}")]
    Corrupt { key: String, reason: String },
}

impl From<LocalStoreError> for EngineError {
    fn from(err: LocalStoreError) -> Self {
        EngineError::Cache(err.to_string())
    }
}

/// Port for durable string key/value storage.
///
/// # Contract
///
/// Implementations must:
/// - Persist each key atomically (a reader sees the old or the new value,
///   never a torn write)
/// - Return `Ok(None)` for absent keys rather than an error
/// - Keep keys from different users separate; the caller namespaces keys,
///   the store must not merge or rewrite them
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Reads the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, LocalStoreError>;

    /// Writes `value` under `key`, replacing any prior value.
    async fn set(&self, key: &str, value: String) -> Result<(), LocalStoreError>;

    /// Removes `key`. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<(), LocalStoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_become_cache_errors() {
        let err: EngineError = LocalStoreError::Io("disk full".to_string()).into();
        assert!(matches!(err, EngineError::Cache(_)));
        assert!(err.is_retryable());
    }
}
