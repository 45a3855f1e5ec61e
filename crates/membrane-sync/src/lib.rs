//! # Membrane Sync - Layer 3: Replication
//!
//! **Purpose**: Keep copies of a membrane on different stores convergent.
//!
//! **Layer 3 depends on membrane-core and membrane-store.**
//! - YES Snapshot projection and verification
//! - YES Version/checksum comparison and merge strategies
//! - YES Sync engine applying remote snapshots to a store
//! - YES Versioned wire envelope
//! - NO transport, peer discovery or scheduling (the caller supplies a
//!   [`SyncBroadcast`] and delivers incoming snapshots)
//!
//! ## Ordering
//!
//! A higher version always wins. Equal versions with different checksums are
//! a conflict; conflicts are results, not errors, and are resolved by a
//! [`MergeStrategy`]. Tie-breaks use the `(membrane_id, checksum)` pair so
//! both replicas pick the same winner.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Sync engine configuration
pub mod config;

/// Sync engine and broadcast seam
pub mod engine;

/// Sync error types
pub mod errors;

/// Comparison and merge strategies
pub mod merge;

/// Snapshot projection and verification
pub mod snapshot;

/// Wire envelope and codec
pub mod wire;

pub use config::SyncConfig;
pub use engine::{ApplyReport, NoopBroadcast, SyncBroadcast, SyncEngine, SyncMetrics, SyncState};
pub use errors::{SyncError, SyncResult};
pub use merge::{
    compare, merge, ConflictResolution, MergeOutcome, MergeStrategy, SyncAction, SyncComparison,
};
pub use snapshot::{snapshot, SyncSnapshot};
pub use wire::{
    deserialize_message, serialize_message, MergeAck, SyncWireMessage, SyncWirePayload,
    SYNC_WIRE_SCHEMA_VERSION,
};
