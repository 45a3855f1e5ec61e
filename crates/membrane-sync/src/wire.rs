//! Sync wire format helpers.
//!
//! Messages are bincode-encoded [`SyncWireMessage`] envelopes. The schema
//! version is the first field, so it can be read before the payload is
//! decoded and a message from an incompatible build is refused cleanly.

use crate::errors::{SyncError, SyncResult};
use crate::merge::SyncAction;
use crate::snapshot::SyncSnapshot;
use membrane_core::MembraneId;
use serde::{Deserialize, Serialize};

/// Schema version written by this build
pub const SYNC_WIRE_SCHEMA_VERSION: u16 = 1;

/// Receiver's answer to a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeAck {
    /// Receiver-side membrane
    pub membrane_id: MembraneId,
    /// Receiver's version after merging
    pub version: u64,
    /// Receiver's checksum after merging
    pub checksum: u32,
    /// Decision the receiver took
    pub action: SyncAction,
}

/// Body of a wire message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SyncWirePayload {
    /// Full membrane snapshot
    Snapshot(SyncSnapshot),
    /// Acknowledgment of a received snapshot
    Ack(MergeAck),
}

/// Versioned envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncWireMessage {
    /// Schema the sender wrote
    pub schema_version: u16,
    /// Message body
    pub payload: SyncWirePayload,
}

impl SyncWireMessage {
    /// Create a snapshot message.
    pub fn snapshot(snapshot: SyncSnapshot) -> Self {
        Self {
            schema_version: SYNC_WIRE_SCHEMA_VERSION,
            payload: SyncWirePayload::Snapshot(snapshot),
        }
    }

    /// Create an acknowledgment message.
    pub fn ack(ack: MergeAck) -> Self {
        Self {
            schema_version: SYNC_WIRE_SCHEMA_VERSION,
            payload: SyncWirePayload::Ack(ack),
        }
    }

    /// Extract the snapshot if this is a Snapshot message.
    pub fn get_snapshot(&self) -> Option<&SyncSnapshot> {
        match &self.payload {
            SyncWirePayload::Snapshot(s) => Some(s),
            SyncWirePayload::Ack(_) => None,
        }
    }

    /// Extract the ack if this is an Ack message.
    pub fn get_ack(&self) -> Option<&MergeAck> {
        match &self.payload {
            SyncWirePayload::Ack(a) => Some(a),
            SyncWirePayload::Snapshot(_) => None,
        }
    }
}

/// Encode a message with bincode
pub fn serialize_message(msg: &SyncWireMessage) -> SyncResult<Vec<u8>> {
    bincode::serialize(msg).map_err(|e| SyncError::serialization(e.to_string()))
}

/// Decode a message, refusing unknown schema versions
pub fn deserialize_message(bytes: &[u8]) -> SyncResult<SyncWireMessage> {
    let header: [u8; 2] = bytes
        .get(..2)
        .and_then(|h| h.try_into().ok())
        .ok_or_else(|| SyncError::serialization("message shorter than its schema header"))?;
    let found = u16::from_le_bytes(header);
    if found != SYNC_WIRE_SCHEMA_VERSION {
        return Err(SyncError::UnsupportedSchema {
            found,
            supported: SYNC_WIRE_SCHEMA_VERSION,
        });
    }
    bincode::deserialize(bytes).map_err(|e| SyncError::serialization(e.to_string()))
}
