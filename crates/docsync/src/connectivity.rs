//! Connectivity monitoring.
//!
//! Holds the single "online" signal. The platform layer calls
//! [`ConnectivityMonitor::set_online`] on network transitions; the sync
//! coordinator subscribes to be woken when the link comes back.

use std::sync::Arc;
use tokio::sync::watch;

/// Online/offline signal shared between the platform and sync components
#[derive(Clone, Debug)]
pub struct ConnectivityMonitor {
    tx: Arc<watch::Sender<bool>>,
}

impl ConnectivityMonitor {
    /// Create a monitor seeded from the platform's current connectivity
    pub fn new(initially_online: bool) -> Self {
        let (tx, _rx) = watch::channel(initially_online);
        Self { tx: Arc::new(tx) }
    }

    /// Whether the network is currently available
    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// Record a connectivity transition. Returns true if the state changed.
    pub fn set_online(&self, online: bool) -> bool {
        let changed = self.tx.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });
        if changed {
            tracing::info!(online, "Connectivity changed");
        }
        changed
    }

    /// Subscribe to connectivity transitions
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}
