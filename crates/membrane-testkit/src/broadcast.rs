//! Broadcast that records what it was asked to send

use membrane_sync::{SyncBroadcast, SyncResult, SyncSnapshot};
use parking_lot::Mutex;
use std::sync::Arc;

/// Cloneable [`SyncBroadcast`] keeping every snapshot it receives
///
/// Clones share one log, so a test can hand one clone to an engine and
/// inspect the other.
#[derive(Debug, Clone, Default)]
pub struct RecordingBroadcast {
    sent: Arc<Mutex<Vec<SyncSnapshot>>>,
}

impl RecordingBroadcast {
    /// Empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshots broadcast so far, oldest first
    pub fn sent(&self) -> Vec<SyncSnapshot> {
        self.sent.lock().clone()
    }

    /// Remove and return the recorded snapshots
    pub fn drain(&self) -> Vec<SyncSnapshot> {
        std::mem::take(&mut *self.sent.lock())
    }
}

impl SyncBroadcast for RecordingBroadcast {
    fn broadcast(&self, snapshot: &SyncSnapshot) -> SyncResult<()> {
        self.sent.lock().push(snapshot.clone());
        Ok(())
    }
}
