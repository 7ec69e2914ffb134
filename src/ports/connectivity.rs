//! Connectivity port - the online/offline gate.
//!
//! The engine samples `is_online` synchronously before choosing the online
//! or offline code path; it never blocks waiting for connectivity. Waiting
//! for the offline-to-online transition is the sync coordinator's job, via
//! the watch channel.

use tokio::sync::watch;

/// Port for observing connectivity.
///
/// One instance is injected per engine; implementations bridge whatever
/// platform notification source is available (browser events, NetworkManager,
/// a manual toggle in tests).
pub trait ConnectivityPort: Send + Sync {
    /// Current connectivity, sampled without blocking.
    fn is_online(&self) -> bool;

    /// A watch receiver that yields on every connectivity change.
    fn subscribe(&self) -> watch::Receiver<bool>;
}
