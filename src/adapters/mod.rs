//! Adapters - concrete implementations of the ports.

pub mod auth;
pub mod connectivity;
pub mod http;
pub mod storage;

pub use auth::StaticAuthProvider;
pub use connectivity::ConnectivityMonitor;
pub use http::{HttpSessionConfig, HttpSessionService};
pub use storage::{FileLocalStore, InMemoryLocalStore};
