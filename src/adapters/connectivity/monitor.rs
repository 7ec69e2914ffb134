//! Watch-channel connectivity monitor.
//!
//! The embedding platform feeds online/offline notifications into
//! [`ConnectivityMonitor::set_online`]; the engine samples the current value
//! and the sync coordinator subscribes to transitions.

use tokio::sync::watch;

use crate::ports::ConnectivityPort;

/// A connectivity gate backed by a watch channel.
#[derive(Debug)]
pub struct ConnectivityMonitor {
    state: watch::Sender<bool>,
}

impl ConnectivityMonitor {
    /// Creates a monitor with the given initial state.
    pub fn new(online: bool) -> Self {
        let (state, _) = watch::channel(online);
        Self { state }
    }

    /// Records a platform online/offline notification.
    pub fn set_online(&self, online: bool) {
        if *self.state.borrow() != online {
            tracing::debug!(online, "connectivity changed");
        }
        // send_replace never fails, even with no active subscribers
        self.state.send_replace(online);
    }
}

impl ConnectivityPort for ConnectivityMonitor {
    fn is_online(&self) -> bool {
        *self.state.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }
}
