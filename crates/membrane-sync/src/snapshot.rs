//! Synchronization snapshots
//!
//! A [`SyncSnapshot`] is the only view of a membrane that crosses the
//! transport boundary. It carries content and ordering metadata but no
//! ownership information: objects, energy and tree links stay local.

use crate::errors::{SyncError, SyncResult};
use membrane_core::{content_checksum, MembraneId, PrimeShape, Result};
use membrane_store::{Membrane, MembraneStore};
use serde::{Deserialize, Serialize};

/// Content and ordering metadata of one membrane
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSnapshot {
    /// Membrane the snapshot was taken from
    pub membrane_id: MembraneId,
    /// Shape of the buffer
    pub shape: PrimeShape,
    /// Version at the time of the snapshot
    pub version: u64,
    /// Checksum over shape and buffer
    pub checksum: u32,
    /// Elements in flat row-major order
    pub buffer: Vec<f32>,
}

impl SyncSnapshot {
    /// Project a membrane
    pub fn from_membrane(membrane: &Membrane) -> Self {
        Self {
            membrane_id: membrane.id(),
            shape: membrane.shape().clone(),
            version: membrane.version(),
            checksum: membrane.checksum(),
            buffer: membrane.buffer().to_vec(),
        }
    }

    /// Build a snapshot from raw content, computing its checksum
    pub fn from_content(
        membrane_id: MembraneId,
        shape: PrimeShape,
        version: u64,
        buffer: Vec<f32>,
    ) -> Self {
        let checksum = content_checksum(&shape, &buffer);
        Self {
            membrane_id,
            shape,
            version,
            checksum,
            buffer,
        }
    }

    /// Check that the buffer matches the shape and the checksum matches both
    pub fn verify(&self) -> SyncResult<()> {
        let volume = self.shape.volume();
        if self.shape.is_empty() {
            return Err(SyncError::corrupt(self.membrane_id, "shape has no axes"));
        }
        if self.buffer.len() as u64 != volume {
            return Err(SyncError::corrupt(
                self.membrane_id,
                format!(
                    "buffer holds {} elements, shape {} needs {volume}",
                    self.buffer.len(),
                    self.shape
                ),
            ));
        }
        let actual = content_checksum(&self.shape, &self.buffer);
        if actual != self.checksum {
            return Err(SyncError::corrupt(
                self.membrane_id,
                format!(
                    "checksum {:08x} does not match content {actual:08x}",
                    self.checksum
                ),
            ));
        }
        Ok(())
    }

    /// Key used to break ties between conflicting snapshots
    pub fn tie_break_key(&self) -> (MembraneId, u32) {
        (self.membrane_id, self.checksum)
    }
}

/// Snapshot a membrane held by `store`
pub fn snapshot(store: &MembraneStore, id: MembraneId) -> Result<SyncSnapshot> {
    store.get_membrane(id).map(SyncSnapshot::from_membrane)
}
