//! # Membrane Store - Layer 2: Domain State
//!
//! **Purpose**: Own membranes, their ownership forest, object sets and tensor
//! buffers, and enforce every capacity limit.
//!
//! # Architecture Constraints
//!
//! **Layer 2 depends only on membrane-core** (foundation).
//! - YES Membrane lifecycle (create, nest, destroy, reshape)
//! - YES P-system object add/remove/transfer
//! - YES Element access with row-major addressing
//! - YES Version and checksum maintenance on every mutation
//! - YES Lock-protected shared handle
//! - NO snapshot comparison or merge (that's membrane-sync)
//! - NO command-line surface (that's membrane-cli)
//!
//! ## Version policy
//!
//! Versions start at 1. Every shape or buffer change bumps the version and
//! recomputes the checksum; object set changes bump the version only. Energy
//! accounting never bumps it.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// The membrane entity
pub mod membrane;

/// Owning arena and lifecycle operations
pub mod store;

/// Object symbol operations
pub mod objects;

/// Element reads and writes
pub mod tensor;

/// Textual rendering of the forest
pub mod structure;

/// Lock-protected shared store handle
pub mod shared;

pub use membrane::Membrane;
pub use shared::SharedMembraneStore;
pub use store::MembraneStore;

// Re-export the foundation types callers need alongside the store
pub use membrane_core::{
    MembraneConfig, MembraneError, MembraneId, MembraneLimits, PrimeShape, Result,
};
