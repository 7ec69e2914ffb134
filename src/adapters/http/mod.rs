//! HTTP adapters for the remote session service.

mod session_client;

pub use session_client::{HttpSessionConfig, HttpSessionService};
