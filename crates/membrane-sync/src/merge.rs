//! Snapshot comparison and merge strategies
//!
//! Ordering is by version first. Two snapshots at the same version with
//! different checksums are in conflict, and a [`MergeStrategy`] decides what
//! the local side becomes. Every decision here is a pure function of the two
//! snapshots, so two replicas that exchange snapshots reach the same result.

use crate::snapshot::SyncSnapshot;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Relation of a remote snapshot to the local one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncComparison {
    /// Local has the higher version
    LocalNewer,
    /// Remote has the higher version
    RemoteNewer,
    /// Same version and same checksum
    Equal,
    /// Same version, different checksum
    Conflict,
}

/// How a conflict is resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// Greater `(membrane_id, checksum)` wins outright
    #[default]
    LastWriterWins,
    /// Elementwise average of both buffers
    Blend,
    /// Keep local, install remote as a sibling
    Split,
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::LastWriterWins => "last_writer_wins",
            Self::Blend => "blend",
            Self::Split => "split",
        };
        f.write_str(name)
    }
}

/// How a particular conflict was settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConflictResolution {
    /// Local content kept
    LocalWins,
    /// Remote content adopted
    RemoteWins,
    /// Buffers averaged into new content
    Blended,
    /// Remote kept alongside local as a sibling
    Split,
}

/// What the receiver does with a remote snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncAction {
    /// Remote is newer or identical; local ends up matching it
    Accept,
    /// Remote is stale and is ignored
    Reject,
    /// Versions tied with different content
    Conflict(ConflictResolution),
}

/// Result of merging a remote snapshot into a local one
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    /// How the snapshots related before merging
    pub comparison: SyncComparison,
    /// Decision taken
    pub action: SyncAction,
    /// What the local membrane should hold afterwards (local id kept)
    pub merged: SyncSnapshot,
    /// Whether `merged` differs from the local input
    pub local_changed: bool,
    /// Remote copy to install as a sibling, for [`MergeStrategy::Split`]
    pub split: Option<SyncSnapshot>,
}

impl MergeOutcome {
    fn unchanged(comparison: SyncComparison, action: SyncAction, local: &SyncSnapshot) -> Self {
        Self {
            comparison,
            action,
            merged: local.clone(),
            local_changed: false,
            split: None,
        }
    }

    fn adopt(
        comparison: SyncComparison,
        action: SyncAction,
        local: &SyncSnapshot,
        remote: &SyncSnapshot,
    ) -> Self {
        Self {
            comparison,
            action,
            merged: SyncSnapshot {
                membrane_id: local.membrane_id,
                ..remote.clone()
            },
            local_changed: true,
            split: None,
        }
    }

    /// Whether the local copy should be pushed back out
    pub fn local_prevails(&self) -> bool {
        matches!(
            self.action,
            SyncAction::Reject
                | SyncAction::Conflict(ConflictResolution::LocalWins | ConflictResolution::Blended)
        )
    }
}

/// Order two snapshots by version, then checksum
pub fn compare(local: &SyncSnapshot, remote: &SyncSnapshot) -> SyncComparison {
    match local.version.cmp(&remote.version) {
        Ordering::Greater => SyncComparison::LocalNewer,
        Ordering::Less => SyncComparison::RemoteNewer,
        Ordering::Equal if local.checksum == remote.checksum => SyncComparison::Equal,
        Ordering::Equal => SyncComparison::Conflict,
    }
}

/// Merge `remote` into `local`; no strategy means last-writer-wins
pub fn merge(
    local: &SyncSnapshot,
    remote: &SyncSnapshot,
    strategy: Option<MergeStrategy>,
) -> MergeOutcome {
    let comparison = compare(local, remote);
    match comparison {
        SyncComparison::RemoteNewer => {
            MergeOutcome::adopt(comparison, SyncAction::Accept, local, remote)
        }
        SyncComparison::LocalNewer => {
            MergeOutcome::unchanged(comparison, SyncAction::Reject, local)
        }
        SyncComparison::Equal => MergeOutcome::unchanged(comparison, SyncAction::Accept, local),
        SyncComparison::Conflict => resolve_conflict(local, remote, strategy.unwrap_or_default()),
    }
}

fn remote_wins_tie(local: &SyncSnapshot, remote: &SyncSnapshot) -> bool {
    remote.tie_break_key() > local.tie_break_key()
}

fn resolve_conflict(
    local: &SyncSnapshot,
    remote: &SyncSnapshot,
    strategy: MergeStrategy,
) -> MergeOutcome {
    let comparison = SyncComparison::Conflict;
    match strategy {
        MergeStrategy::Blend if local.buffer.len() == remote.buffer.len() => {
            let winner = if remote_wins_tie(local, remote) {
                remote
            } else {
                local
            };
            let buffer = local
                .buffer
                .iter()
                .zip(&remote.buffer)
                .map(|(a, b)| (a + b) / 2.0)
                .collect();
            let merged = SyncSnapshot::from_content(
                local.membrane_id,
                winner.shape.clone(),
                local.version + 1,
                buffer,
            );
            MergeOutcome {
                comparison,
                action: SyncAction::Conflict(ConflictResolution::Blended),
                merged,
                local_changed: true,
                split: None,
            }
        }
        MergeStrategy::Split => MergeOutcome {
            split: Some(remote.clone()),
            ..MergeOutcome::unchanged(
                comparison,
                SyncAction::Conflict(ConflictResolution::Split),
                local,
            )
        },
        // Blend across different volumes falls through to last-writer-wins.
        MergeStrategy::LastWriterWins | MergeStrategy::Blend => {
            if remote_wins_tie(local, remote) {
                MergeOutcome::adopt(
                    comparison,
                    SyncAction::Conflict(ConflictResolution::RemoteWins),
                    local,
                    remote,
                )
            } else {
                MergeOutcome::unchanged(
                    comparison,
                    SyncAction::Conflict(ConflictResolution::LocalWins),
                    local,
                )
            }
        }
    }
}
