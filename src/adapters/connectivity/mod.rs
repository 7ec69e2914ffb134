//! Connectivity adapters.

mod monitor;

pub use monitor::ConnectivityMonitor;
