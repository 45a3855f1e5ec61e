//! Sync engine configuration.

use crate::merge::MergeStrategy;
use serde::{Deserialize, Serialize};

/// Runtime policy of a [`SyncEngine`](crate::SyncEngine)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Strategy applied to conflicts
    pub default_strategy: MergeStrategy,
    /// Push the local snapshot back out when it prevails over a remote one
    pub rebroadcast_local_wins: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            default_strategy: MergeStrategy::LastWriterWins,
            rebroadcast_local_wins: true,
        }
    }
}
