//! Unified error type for membrane store operations
//!
//! Every fallible store operation returns [`MembraneError`]. The variants carry
//! enough context for diagnostics, while [`ErrorKind`] collapses them onto the
//! small set of kinds callers are expected to branch on.

use crate::identifiers::MembraneId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Broad classification of a [`MembraneError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Empty, oversized or malformed prime factor sequence
    InvalidShape,
    /// Unknown membrane or object symbol
    NotFound,
    /// A child, object, membrane-count, depth, volume or energy limit was hit
    CapacityExceeded,
    /// Reshape between shapes of different volume
    IncompatibleShape,
    /// Element access outside the shape
    IndexOutOfBounds,
    /// Object symbol rejected before any lookup
    InvalidSymbol,
}

/// Resource whose configured limit was exceeded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CapacityResource {
    /// Membranes registered in one store
    Membranes,
    /// Children owned by one membrane
    Children,
    /// Nesting depth of the ownership tree
    Depth,
    /// Distinct object symbols in one membrane
    Objects,
    /// Scalar elements in one buffer
    Volume,
    /// Energy available to one membrane
    Energy,
}

impl fmt::Display for CapacityResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Membranes => "membranes",
            Self::Children => "children",
            Self::Depth => "nesting depth",
            Self::Objects => "objects",
            Self::Volume => "volume",
            Self::Energy => "energy",
        };
        f.write_str(name)
    }
}

/// Error returned by membrane store operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MembraneError {
    /// The prime factor sequence cannot describe a membrane
    #[error("Invalid shape: {reason}")]
    InvalidShape {
        /// Why the shape was rejected
        reason: String,
    },

    /// Reshape target has a different volume
    #[error("Incompatible shape: volume {from_volume} cannot become volume {to_volume}")]
    IncompatibleShape {
        /// Volume of the current shape
        from_volume: u64,
        /// Volume of the requested shape
        to_volume: u64,
    },

    /// No membrane with this id is registered
    #[error("Membrane not found: {id}")]
    MembraneNotFound {
        /// The missing membrane
        id: MembraneId,
    },

    /// The membrane does not hold this symbol
    #[error("Object '{symbol}' not found in {id}")]
    ObjectNotFound {
        /// Membrane that was searched
        id: MembraneId,
        /// The missing symbol
        symbol: String,
    },

    /// A configured limit would be exceeded
    #[error("Capacity exceeded: {resource} limit is {limit}")]
    CapacityExceeded {
        /// Which limit was hit
        resource: CapacityResource,
        /// The limit in force
        limit: u64,
    },

    /// Index list length differs from the shape rank
    #[error("Index out of bounds: expected {expected} indices, got {actual}")]
    IndexRankMismatch {
        /// Rank of the shape
        expected: usize,
        /// Number of indices supplied
        actual: usize,
    },

    /// One coordinate is at or beyond its axis size
    #[error("Index out of bounds: index {index} on axis {axis} (size {bound})")]
    IndexOutOfBounds {
        /// Axis position
        axis: usize,
        /// Offending coordinate
        index: u32,
        /// Size of that axis
        bound: u32,
    },

    /// Object symbol is not acceptable
    #[error("Invalid symbol: {reason}")]
    InvalidSymbol {
        /// Why the symbol was rejected
        reason: String,
    },
}

impl MembraneError {
    /// Create an invalid shape error
    pub fn invalid_shape(reason: impl Into<String>) -> Self {
        Self::InvalidShape {
            reason: reason.into(),
        }
    }

    /// Create a membrane not found error
    pub fn membrane_not_found(id: MembraneId) -> Self {
        Self::MembraneNotFound { id }
    }

    /// Create an object not found error
    pub fn object_not_found(id: MembraneId, symbol: impl Into<String>) -> Self {
        Self::ObjectNotFound {
            id,
            symbol: symbol.into(),
        }
    }

    /// Create a capacity exceeded error
    pub fn capacity(resource: CapacityResource, limit: impl Into<u64>) -> Self {
        Self::CapacityExceeded {
            resource,
            limit: limit.into(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidShape { .. } => ErrorKind::InvalidShape,
            Self::IncompatibleShape { .. } => ErrorKind::IncompatibleShape,
            Self::MembraneNotFound { .. } | Self::ObjectNotFound { .. } => ErrorKind::NotFound,
            Self::CapacityExceeded { .. } => ErrorKind::CapacityExceeded,
            Self::IndexRankMismatch { .. } | Self::IndexOutOfBounds { .. } => {
                ErrorKind::IndexOutOfBounds
            }
            Self::InvalidSymbol { .. } => ErrorKind::InvalidSymbol,
        }
    }

    /// Stable numeric code for logs and wire acknowledgments
    pub fn code(&self) -> u16 {
        match self {
            Self::InvalidShape { .. } => 100,
            Self::IncompatibleShape { .. } => 101,
            Self::MembraneNotFound { .. } => 200,
            Self::ObjectNotFound { .. } => 201,
            Self::CapacityExceeded { .. } => 300,
            Self::IndexRankMismatch { .. } => 400,
            Self::IndexOutOfBounds { .. } => 401,
            Self::InvalidSymbol { .. } => 500,
        }
    }
}

/// Standard Result type for membrane operations
pub type Result<T> = std::result::Result<T, MembraneError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_error_codes_are_unique() {
        let id = MembraneId::new(1);
        let errors = [
            MembraneError::invalid_shape("empty"),
            MembraneError::IncompatibleShape {
                from_volume: 30,
                to_volume: 77,
            },
            MembraneError::membrane_not_found(id),
            MembraneError::object_not_found(id, "x"),
            MembraneError::capacity(CapacityResource::Objects, 16u64),
            MembraneError::IndexRankMismatch {
                expected: 3,
                actual: 2,
            },
            MembraneError::IndexOutOfBounds {
                axis: 0,
                index: 2,
                bound: 2,
            },
            MembraneError::InvalidSymbol {
                reason: "empty".to_string(),
            },
        ];

        let codes: HashSet<_> = errors.iter().map(MembraneError::code).collect();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_kinds_collapse_not_found_and_bounds() {
        let id = MembraneId::new(7);
        assert_eq!(
            MembraneError::membrane_not_found(id).kind(),
            MembraneError::object_not_found(id, "a").kind()
        );
        assert_eq!(
            MembraneError::IndexRankMismatch {
                expected: 1,
                actual: 0
            }
            .kind(),
            ErrorKind::IndexOutOfBounds
        );
    }

    #[test]
    fn test_display_mentions_context() {
        let msg = MembraneError::capacity(CapacityResource::Children, 8u64).to_string();
        assert!(msg.contains("children"));
        assert!(msg.contains('8'));

        let msg = MembraneError::object_not_found(MembraneId::new(3), "glucose").to_string();
        assert!(msg.contains("glucose"));
        assert!(msg.contains("membrane-3"));
    }
}
