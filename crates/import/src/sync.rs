//! Applies pushed configuration to the store.

use std::sync::Arc;

use distro_config::{ConfigStore, StoreError, merge_snapshot};
use distro_protocol::messages::{ConfigChange, ConfigSnapshot};

use crate::transport::TransportHandle;

/// Whether the connection outlives the first snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Close after the first snapshot.
    OneShot,
    /// Stay connected and apply `change` pushes.
    Listen,
}

impl SyncMode {
    pub fn from_listen(listen: bool) -> Self {
        if listen { SyncMode::Listen } else { SyncMode::OneShot }
    }
}

/// Merges snapshots and changes into the shared store.
pub struct ConfigSync {
    store: Arc<dyn ConfigStore>,
    mode: SyncMode,
}

impl ConfigSync {
    pub fn new(store: Arc<dyn ConfigStore>, mode: SyncMode) -> Self {
        Self { store, mode }
    }

    pub fn mode(&self) -> SyncMode {
        self.mode
    }

    /// Merges every key of `snapshot`. In one-shot mode the transport is
    /// closed first so no further pushes land mid-merge.
    ///
    /// Returns the number of keys written.
    pub fn apply_snapshot(&self, handle: &TransportHandle, snapshot: &ConfigSnapshot) -> usize {
        if self.mode == SyncMode::OneShot {
            handle.close();
        }
        merge_snapshot(self.store.as_ref(), snapshot)
    }

    /// Sets the single pushed key.
    pub fn apply_change(&self, change: &ConfigChange) -> Result<(), StoreError> {
        self.store.set(&change.key, change.value.clone())
    }
}
