//! Membrane identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Identifier of a membrane within one store
///
/// Ids are handed out by a monotonic counter owned by the store and are never
/// reused, so a stale id can only ever resolve to "not found".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MembraneId(u32);

impl MembraneId {
    /// Wrap a raw id
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Return the raw id
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for MembraneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "membrane-{}", self.0)
    }
}

impl From<u32> for MembraneId {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl From<MembraneId> for u32 {
    fn from(id: MembraneId) -> Self {
        id.0
    }
}

/// Accepts both `"7"` and `"membrane-7"`.
impl FromStr for MembraneId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let raw = raw.strip_prefix("membrane-").unwrap_or(raw);
        raw.parse::<u32>().map(Self)
    }
}
