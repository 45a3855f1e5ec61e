//! Synchronization error types

use membrane_core::{MembraneError, MembraneId};

/// Error raised while verifying, merging or transmitting snapshots
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SyncError {
    /// Snapshot content does not match its declared shape or checksum
    #[error("Corrupt snapshot for {membrane_id}: {reason}")]
    CorruptSnapshot {
        /// Membrane the snapshot claims to describe
        membrane_id: MembraneId,
        /// What failed to verify
        reason: String,
    },

    /// Wire message written under a schema this build does not read
    #[error("Unsupported wire schema {found}, expected {supported}")]
    UnsupportedSchema {
        /// Schema version found in the message
        found: u16,
        /// Schema version this build reads and writes
        supported: u16,
    },

    /// Encoding or decoding failed
    #[error("Serialization error: {reason}")]
    Serialization {
        /// Underlying codec failure
        reason: String,
    },

    /// The outbound broadcast seam refused a snapshot
    #[error("Broadcast failed: {reason}")]
    Broadcast {
        /// Why the broadcast failed
        reason: String,
    },

    /// A store operation failed while applying a merge
    #[error(transparent)]
    Store(#[from] MembraneError),
}

impl SyncError {
    /// Create a corrupt snapshot error
    pub fn corrupt(membrane_id: MembraneId, reason: impl Into<String>) -> Self {
        Self::CorruptSnapshot {
            membrane_id,
            reason: reason.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(reason: impl Into<String>) -> Self {
        Self::Serialization {
            reason: reason.into(),
        }
    }

    /// Create a broadcast error
    pub fn broadcast(reason: impl Into<String>) -> Self {
        Self::Broadcast {
            reason: reason.into(),
        }
    }
}

/// Result type for synchronization operations
pub type SyncResult<T> = std::result::Result<T, SyncError>;
