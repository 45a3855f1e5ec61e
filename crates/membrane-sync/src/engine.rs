//! Sync engine: applies remote snapshots to a local store
//!
//! The engine sits between the transport layer and a [`MembraneStore`]. It
//! verifies incoming snapshots, merges them against the local membrane,
//! installs whatever the merge decided and pushes the local copy back out
//! through a [`SyncBroadcast`] when the local side prevailed.

use crate::config::SyncConfig;
use crate::errors::SyncResult;
use crate::merge::{merge, ConflictResolution, MergeStrategy, SyncAction, SyncComparison};
use crate::snapshot::{snapshot, SyncSnapshot};
use crate::wire::MergeAck;
use membrane_core::MembraneId;
use membrane_store::{MembraneStore, SharedMembraneStore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Outbound seam towards the transport layer
pub trait SyncBroadcast: Send + Sync {
    /// Announce a local snapshot to peers
    fn broadcast(&self, snapshot: &SyncSnapshot) -> SyncResult<()>;
}

/// Broadcast that drops everything; for engines without peers
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopBroadcast;

impl SyncBroadcast for NoopBroadcast {
    fn broadcast(&self, _snapshot: &SyncSnapshot) -> SyncResult<()> {
        Ok(())
    }
}

/// Per-membrane synchronization state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SyncState {
    /// No remote snapshot seen yet
    #[default]
    Idle,
    /// Last exchange left both sides with the same content
    InSync,
    /// Local is ahead of the last remote seen
    Diverged,
    /// Last conflict was split off into a sibling
    Split {
        /// Membrane holding the remote copy
        sibling: MembraneId,
    },
}

/// Counters kept by a [`SyncEngine`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncMetrics {
    /// Remote snapshots received
    pub received: u64,
    /// Snapshots rejected by verification
    pub corrupt: u64,
    /// Remote content adopted or already equal
    pub accepted: u64,
    /// Remote snapshots older than local
    pub rejected: u64,
    /// Version ties with different content
    pub conflicts: u64,
    /// Conflicts resolved by averaging
    pub blends: u64,
    /// Conflicts resolved by creating a sibling
    pub splits: u64,
    /// Local snapshots pushed out
    pub broadcasts: u64,
    /// Rebroadcasts the outbound seam refused
    pub broadcast_failures: u64,
}

/// What [`SyncEngine::apply_remote`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyReport {
    /// Local membrane the snapshot was applied to
    pub membrane_id: MembraneId,
    /// Relation before merging
    pub comparison: SyncComparison,
    /// Decision taken
    pub action: SyncAction,
    /// Local version afterwards
    pub version: u64,
    /// Local checksum afterwards
    pub checksum: u32,
    /// Sibling created for a split conflict
    pub sibling: Option<MembraneId>,
    /// Whether the local snapshot was broadcast
    pub broadcast: bool,
}

impl ApplyReport {
    /// Acknowledgment to send back to the peer
    pub fn ack(&self) -> MergeAck {
        MergeAck {
            membrane_id: self.membrane_id,
            version: self.version,
            checksum: self.checksum,
            action: self.action,
        }
    }
}

/// Applies remote snapshots to a local store
#[derive(Debug)]
pub struct SyncEngine<B: SyncBroadcast = NoopBroadcast> {
    config: SyncConfig,
    broadcast: B,
    states: BTreeMap<MembraneId, SyncState>,
    metrics: SyncMetrics,
}

impl SyncEngine<NoopBroadcast> {
    /// Engine that never broadcasts
    pub fn new(config: SyncConfig) -> Self {
        Self::with_broadcast(config, NoopBroadcast)
    }
}

impl Default for SyncEngine<NoopBroadcast> {
    fn default() -> Self {
        Self::new(SyncConfig::default())
    }
}

impl<B: SyncBroadcast> SyncEngine<B> {
    /// Engine with an outbound broadcast
    pub fn with_broadcast(config: SyncConfig, broadcast: B) -> Self {
        Self {
            config,
            broadcast,
            states: BTreeMap::new(),
            metrics: SyncMetrics::default(),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// The outbound broadcast
    pub fn broadcaster(&self) -> &B {
        &self.broadcast
    }

    /// Counters since creation
    pub fn metrics(&self) -> &SyncMetrics {
        &self.metrics
    }

    /// Sync state of one membrane
    pub fn state(&self, id: MembraneId) -> SyncState {
        self.states.get(&id).copied().unwrap_or_default()
    }

    /// Drop tracked state, e.g. after the membrane was destroyed
    pub fn forget(&mut self, id: MembraneId) {
        self.states.remove(&id);
    }

    /// Apply a remote snapshot using the configured strategy
    pub fn apply_remote(
        &mut self,
        store: &mut MembraneStore,
        local_id: MembraneId,
        remote: &SyncSnapshot,
    ) -> SyncResult<ApplyReport> {
        self.apply_remote_with(store, local_id, remote, self.config.default_strategy)
    }

    /// Apply a remote snapshot to a shared store
    ///
    /// The merge runs under the write lock; any rebroadcast happens after the
    /// lock is released.
    pub fn apply_shared(
        &mut self,
        store: &SharedMembraneStore,
        local_id: MembraneId,
        remote: &SyncSnapshot,
    ) -> SyncResult<ApplyReport> {
        let strategy = self.config.default_strategy;
        let (mut report, current) =
            store.write(|inner| self.merge_into(inner, local_id, remote, strategy))?;
        self.announce(&mut report, &current);
        Ok(report)
    }

    /// Apply a remote snapshot with an explicit conflict strategy
    ///
    /// Nothing in the store changes when the snapshot fails verification or
    /// the merge result cannot be installed. Once the merge is installed the
    /// call succeeds; a failed rebroadcast is logged and reported through
    /// [`ApplyReport::broadcast`].
    pub fn apply_remote_with(
        &mut self,
        store: &mut MembraneStore,
        local_id: MembraneId,
        remote: &SyncSnapshot,
        strategy: MergeStrategy,
    ) -> SyncResult<ApplyReport> {
        let (mut report, current) = self.merge_into(store, local_id, remote, strategy)?;
        self.announce(&mut report, &current);
        Ok(report)
    }

    /// Verify, merge and install; returns the local snapshot afterwards
    fn merge_into(
        &mut self,
        store: &mut MembraneStore,
        local_id: MembraneId,
        remote: &SyncSnapshot,
        strategy: MergeStrategy,
    ) -> SyncResult<(ApplyReport, SyncSnapshot)> {
        self.metrics.received += 1;
        if let Err(err) = remote.verify() {
            self.metrics.corrupt += 1;
            warn!(membrane = %local_id, remote = %remote.membrane_id, error = %err, "Rejected remote snapshot");
            return Err(err);
        }

        let local = snapshot(store, local_id)?;
        let outcome = merge(&local, remote, Some(strategy));

        let sibling = match &outcome.split {
            Some(split) => Some(install_sibling(store, local_id, split)?),
            None => None,
        };
        if outcome.local_changed {
            let merged = outcome.merged.clone();
            store.install_content(local_id, merged.shape, merged.buffer, merged.version)?;
        }

        self.record(local_id, outcome.action, sibling);
        info!(
            membrane = %local_id,
            remote = %remote.membrane_id,
            comparison = ?outcome.comparison,
            action = ?outcome.action,
            "Applied remote snapshot"
        );

        let current = snapshot(store, local_id)?;
        let report = ApplyReport {
            membrane_id: local_id,
            comparison: outcome.comparison,
            action: outcome.action,
            version: current.version,
            checksum: current.checksum,
            sibling,
            broadcast: self.config.rebroadcast_local_wins && outcome.local_prevails(),
        };
        Ok((report, current))
    }

    /// Push `current` out if the report asks for it; clears the flag on failure
    fn announce(&mut self, report: &mut ApplyReport, current: &SyncSnapshot) {
        if !report.broadcast {
            return;
        }
        match self.broadcast.broadcast(current) {
            Ok(()) => {
                self.metrics.broadcasts += 1;
                debug!(membrane = %report.membrane_id, version = current.version, "Rebroadcast local snapshot");
            }
            Err(err) => {
                report.broadcast = false;
                self.metrics.broadcast_failures += 1;
                warn!(membrane = %report.membrane_id, error = %err, "Rebroadcast failed after merge");
            }
        }
    }

    /// Snapshot a local membrane and broadcast it
    pub fn publish(&mut self, store: &MembraneStore, id: MembraneId) -> SyncResult<SyncSnapshot> {
        let current = snapshot(store, id)?;
        self.broadcast.broadcast(&current)?;
        self.metrics.broadcasts += 1;
        debug!(membrane = %id, version = current.version, "Published snapshot");
        Ok(current)
    }

    fn record(&mut self, id: MembraneId, action: SyncAction, sibling: Option<MembraneId>) {
        let state = match action {
            SyncAction::Accept => {
                self.metrics.accepted += 1;
                SyncState::InSync
            }
            SyncAction::Reject => {
                self.metrics.rejected += 1;
                SyncState::Diverged
            }
            SyncAction::Conflict(resolution) => {
                self.metrics.conflicts += 1;
                match (resolution, sibling) {
                    (ConflictResolution::Split, Some(sibling)) => {
                        self.metrics.splits += 1;
                        SyncState::Split { sibling }
                    }
                    (ConflictResolution::Blended, _) => {
                        self.metrics.blends += 1;
                        SyncState::InSync
                    }
                    _ => SyncState::InSync,
                }
            }
        };
        self.states.insert(id, state);
    }
}

/// Install `split` next to `local_id`: same parent, or a new root
fn install_sibling(
    store: &mut MembraneStore,
    local_id: MembraneId,
    split: &SyncSnapshot,
) -> SyncResult<MembraneId> {
    let sibling = match store.parent(local_id)? {
        Some(parent) => store.create_child(parent, split.shape.clone())?,
        None => store.create(split.shape.clone())?,
    };
    if let Err(err) = store.install_content(sibling, split.shape.clone(), split.buffer.clone(), 1) {
        store.destroy(sibling)?;
        return Err(err.into());
    }
    info!(membrane = %local_id, sibling = %sibling, "Split conflicting snapshot into sibling");
    Ok(sibling)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SyncError;
    use membrane_core::PrimeShape;
    use std::sync::{Arc, Mutex};

    #[derive(Default, Clone)]
    struct Collector(Arc<Mutex<Vec<SyncSnapshot>>>);

    impl SyncBroadcast for Collector {
        fn broadcast(&self, snapshot: &SyncSnapshot) -> SyncResult<()> {
            self.0.lock().unwrap().push(snapshot.clone());
            Ok(())
        }
    }

    struct Unreachable;

    impl SyncBroadcast for Unreachable {
        fn broadcast(&self, _snapshot: &SyncSnapshot) -> SyncResult<()> {
            Err(SyncError::Broadcast {
                reason: "peer unreachable".to_string(),
            })
        }
    }

    /// Broadcast that records whether the store lock was free when called
    struct LockProbe {
        store: SharedMembraneStore,
        lock_free: Arc<Mutex<Vec<bool>>>,
    }

    impl SyncBroadcast for LockProbe {
        fn broadcast(&self, _snapshot: &SyncSnapshot) -> SyncResult<()> {
            let free = self.store.try_read(|_| ()).is_some();
            self.lock_free.lock().unwrap().push(free);
            Ok(())
        }
    }

    fn store_with(factors: &[u32]) -> (MembraneStore, MembraneId) {
        let mut store = MembraneStore::new();
        let id = store.create(PrimeShape::new(factors.to_vec()).unwrap()).unwrap();
        (store, id)
    }

    #[test]
    fn test_remote_newer_installs() {
        let (mut store, id) = store_with(&[2, 3]);
        let remote = SyncSnapshot::from_content(
            MembraneId::new(40),
            PrimeShape::new(vec![3, 2]).unwrap(),
            6,
            vec![4.0; 6],
        );

        let mut engine = SyncEngine::new(SyncConfig::default());
        let report = engine.apply_remote(&mut store, id, &remote).unwrap();

        assert_eq!(report.action, SyncAction::Accept);
        assert_eq!(report.version, 6);
        assert_eq!(report.checksum, remote.checksum);
        assert_eq!(store.get_membrane(id).unwrap().shape(), &remote.shape);
        assert_eq!(engine.state(id), SyncState::InSync);
        assert_eq!(engine.metrics().accepted, 1);
    }

    #[test]
    fn test_corrupt_snapshot_changes_nothing() {
        let (mut store, id) = store_with(&[2]);
        let before = store.get_membrane(id).unwrap().clone();
        let mut remote = SyncSnapshot::from_content(id, PrimeShape::new(vec![2]).unwrap(), 9, vec![1.0; 2]);
        remote.checksum ^= 1;

        let mut engine = SyncEngine::new(SyncConfig::default());
        assert!(engine.apply_remote(&mut store, id, &remote).is_err());
        assert_eq!(store.get_membrane(id).unwrap(), &before);
        assert_eq!(engine.metrics().corrupt, 1);
        assert_eq!(engine.state(id), SyncState::Idle);
    }

    #[test]
    fn test_stale_remote_triggers_rebroadcast() {
        let (mut store, id) = store_with(&[2]);
        store.fill(id, 1.0).unwrap();
        store.fill(id, 2.0).unwrap();
        let remote = SyncSnapshot::from_content(id, PrimeShape::new(vec![2]).unwrap(), 1, vec![0.0; 2]);

        let collector = Collector::default();
        let mut engine = SyncEngine::with_broadcast(SyncConfig::default(), collector.clone());
        let report = engine.apply_remote(&mut store, id, &remote).unwrap();

        assert_eq!(report.action, SyncAction::Reject);
        assert!(report.broadcast);
        assert_eq!(engine.state(id), SyncState::Diverged);
        let sent = collector.0.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].version, 3);
    }

    #[test]
    fn test_split_creates_sibling_under_same_parent() {
        let mut store = MembraneStore::new();
        let root = store.create(PrimeShape::new(vec![5]).unwrap()).unwrap();
        let id = store
            .create_child(root, PrimeShape::new(vec![2]).unwrap())
            .unwrap();
        let remote = SyncSnapshot::from_content(
            MembraneId::new(77),
            PrimeShape::new(vec![2]).unwrap(),
            1,
            vec![8.0, 9.0],
        );

        let mut engine = SyncEngine::new(SyncConfig::default());
        let report = engine
            .apply_remote_with(&mut store, id, &remote, MergeStrategy::Split)
            .unwrap();

        let sibling = report.sibling.unwrap();
        assert_eq!(store.parent(sibling).unwrap(), Some(root));
        assert_eq!(store.children(root).unwrap(), &[id, sibling]);
        let installed = store.get_membrane(sibling).unwrap();
        assert_eq!(installed.version(), 1);
        assert_eq!(installed.buffer(), &[8.0, 9.0]);
        assert_eq!(installed.checksum(), remote.checksum);
        assert_eq!(store.get_membrane(id).unwrap().version(), 1);
        assert_eq!(engine.state(id), SyncState::Split { sibling });
        assert!(!report.broadcast);
    }

    #[test]
    fn test_failed_rebroadcast_keeps_committed_blend() {
        let (mut store, id) = store_with(&[2]);
        store.fill(id, 1.0).unwrap();
        let remote = SyncSnapshot::from_content(
            MembraneId::new(50),
            PrimeShape::new(vec![2]).unwrap(),
            2,
            vec![3.0, 3.0],
        );

        let mut engine = SyncEngine::with_broadcast(SyncConfig::default(), Unreachable);
        let report = engine
            .apply_remote_with(&mut store, id, &remote, MergeStrategy::Blend)
            .unwrap();

        assert_eq!(
            report.action,
            SyncAction::Conflict(ConflictResolution::Blended)
        );
        assert!(!report.broadcast);
        let membrane = store.get_membrane(id).unwrap();
        assert_eq!(membrane.version(), 3);
        assert_eq!(membrane.buffer(), &[2.0, 2.0]);
        assert_eq!(report.version, 3);
        assert_eq!(report.checksum, membrane.checksum());
        assert_eq!(engine.metrics().broadcasts, 0);
        assert_eq!(engine.metrics().broadcast_failures, 1);
    }

    #[test]
    fn test_failed_rebroadcast_still_reports_reject() {
        let (mut store, id) = store_with(&[2]);
        store.fill(id, 5.0).unwrap();
        let remote = SyncSnapshot::from_content(id, PrimeShape::new(vec![2]).unwrap(), 1, vec![0.0; 2]);

        let mut engine = SyncEngine::with_broadcast(SyncConfig::default(), Unreachable);
        let report = engine.apply_remote(&mut store, id, &remote).unwrap();

        assert_eq!(report.action, SyncAction::Reject);
        assert!(!report.broadcast);
        assert_eq!(report.ack().version, 2);
        assert_eq!(engine.state(id), SyncState::Diverged);
    }

    #[test]
    fn test_shared_rebroadcast_runs_outside_lock() {
        let (mut store, id) = store_with(&[2]);
        store.fill(id, 1.0).unwrap();
        let shared = SharedMembraneStore::new(store);
        let stale = SyncSnapshot::from_content(id, PrimeShape::new(vec![2]).unwrap(), 1, vec![0.0; 2]);

        let lock_free = Arc::new(Mutex::new(Vec::new()));
        let probe = LockProbe {
            store: shared.clone(),
            lock_free: Arc::clone(&lock_free),
        };
        let mut engine = SyncEngine::with_broadcast(SyncConfig::default(), probe);
        let report = engine.apply_shared(&shared, id, &stale).unwrap();

        assert!(report.broadcast);
        assert_eq!(*lock_free.lock().unwrap(), vec![true]);
    }

    #[test]
    fn test_apply_shared() {
        let (store, id) = store_with(&[3]);
        let shared = SharedMembraneStore::new(store);
        let remote = SyncSnapshot::from_content(id, PrimeShape::new(vec![3]).unwrap(), 2, vec![1.0; 3]);

        let mut engine = SyncEngine::new(SyncConfig::default());
        engine.apply_shared(&shared, id, &remote).unwrap();
        assert_eq!(shared.version_and_checksum(id).unwrap(), (2, remote.checksum));
    }
}
