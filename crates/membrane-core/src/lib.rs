//! # Membrane Core - Layer 1: Foundation
//!
//! **Purpose**: Pure types and functions shared by every membrane crate.
//!
//! - YES Prime-factor shape algebra (primality, factorization, volume, strides)
//! - YES Membrane identifiers
//! - YES Unified error type and error kinds
//! - YES Content checksums
//! - YES Capacity limits and buffer initialization policy
//! - NO membrane state or ownership tree (that's membrane-store)
//! - NO snapshot comparison or merge (that's membrane-sync)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Capacity limits, buffer initialization and TOML loading
pub mod config;

/// Unified error type
pub mod errors;

/// BLAKE3 hashing and content checksums
pub mod hash;

/// Membrane identifiers
pub mod identifiers;

/// Prime-factor shape algebra
pub mod shape;

pub use config::{BufferInit, ConfigError, MembraneConfig, MembraneLimits};
pub use errors::{CapacityResource, ErrorKind, MembraneError, Result};
pub use hash::content_checksum;
pub use identifiers::MembraneId;
pub use shape::{factorize, is_prime, rank, reshapable, volume, PrimeShape};
