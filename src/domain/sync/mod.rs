//! Sync module - durable mirroring and client/server reconciliation.

mod cache_key;
mod coordinator;
mod local_cache;
mod pending;

pub use cache_key::{CacheField, CacheKey};
pub use coordinator::{FlushOutcome, ReconciledSession, SessionSource, SyncCoordinator};
pub use local_cache::LocalCache;
pub use pending::PendingSubmission;
