//! Two-replica synchronization scenarios
//!
//! Each test runs two stores holding copies of one membrane, exchanges
//! snapshots through engines wired to recording broadcasts, and checks that
//! both copies settle on the same content.

use membrane_core::MembraneId;
use membrane_store::MembraneStore;
use membrane_sync::{
    deserialize_message, serialize_message, snapshot, ApplyReport, ConflictResolution,
    MergeStrategy, SyncAction, SyncConfig, SyncEngine, SyncSnapshot, SyncState, SyncWireMessage,
};
use membrane_testkit::{replica_pair, shape, RecordingBroadcast};

struct Replica {
    store: MembraneStore,
    id: MembraneId,
    engine: SyncEngine<RecordingBroadcast>,
    outbox: RecordingBroadcast,
}

impl Replica {
    fn new(store: MembraneStore, id: MembraneId, strategy: MergeStrategy) -> Self {
        let outbox = RecordingBroadcast::new();
        let config = SyncConfig {
            default_strategy: strategy,
            ..SyncConfig::default()
        };
        Self {
            store,
            id,
            engine: SyncEngine::with_broadcast(config, outbox.clone()),
            outbox,
        }
    }

    fn outgoing(&self) -> SyncSnapshot {
        snapshot(&self.store, self.id).unwrap()
    }

    /// Deliver a snapshot through the wire codec
    fn deliver(&mut self, remote: SyncSnapshot) -> ApplyReport {
        let bytes = serialize_message(&SyncWireMessage::snapshot(remote)).unwrap();
        let message = deserialize_message(&bytes).unwrap();
        let remote = message.get_snapshot().unwrap();
        self.engine.apply_remote(&mut self.store, self.id, remote).unwrap()
    }

    fn receive(&mut self, from: &Replica) -> ApplyReport {
        self.deliver(from.outgoing())
    }

    fn content(&self) -> (u64, u32) {
        let membrane = self.store.get_membrane(self.id).unwrap();
        (membrane.version(), membrane.checksum())
    }
}

fn replicas(strategy: MergeStrategy) -> (Replica, Replica) {
    let ((sa, a), (sb, b)) = replica_pair(&[2, 3]);
    (Replica::new(sa, a, strategy), Replica::new(sb, b, strategy))
}

#[test]
fn test_newer_write_propagates() {
    let (mut a, mut b) = replicas(MergeStrategy::LastWriterWins);
    a.store.fill(a.id, 4.0).unwrap();

    let report = b.receive(&a);
    assert_eq!(report.action, SyncAction::Accept);
    assert_eq!(a.content(), b.content());
    assert_eq!(b.store.get(b.id, &[1, 2]).unwrap(), 4.0);

    // The ack travels back and a's copy is already current.
    let ack = report.ack();
    assert_eq!((ack.version, ack.checksum), a.content());
    let echo = a.receive(&b);
    assert_eq!(echo.action, SyncAction::Accept);
    assert!(!echo.broadcast);
}

#[test]
fn test_concurrent_writes_converge_under_lww() {
    let (mut a, mut b) = replicas(MergeStrategy::LastWriterWins);
    a.store.fill(a.id, 1.0).unwrap();
    b.store.fill(b.id, 2.0).unwrap();

    // Both snapshots are in flight before either side applies.
    let (from_a, from_b) = (a.outgoing(), b.outgoing());
    let on_b = b.deliver(from_a);
    let on_a = a.deliver(from_b);
    assert!(matches!(on_b.action, SyncAction::Conflict(_)));
    assert!(matches!(on_a.action, SyncAction::Conflict(_)));
    assert_eq!(a.content(), b.content());

    // Exactly one side kept its copy and rebroadcast it.
    let sent = a.outbox.sent().len() + b.outbox.sent().len();
    assert_eq!(sent, 1);
}

#[test]
fn test_concurrent_writes_blend() {
    let (mut a, mut b) = replicas(MergeStrategy::Blend);
    a.store.fill(a.id, 1.0).unwrap();
    b.store.fill(b.id, 3.0).unwrap();

    let report = b.receive(&a);
    assert_eq!(
        report.action,
        SyncAction::Conflict(ConflictResolution::Blended)
    );
    assert_eq!(report.version, 3);
    assert!(b.store.buffer(b.id).unwrap().iter().all(|v| *v == 2.0));

    // Blended content at a higher version is simply adopted by a.
    let back = a.receive(&b);
    assert_eq!(back.action, SyncAction::Accept);
    assert_eq!(a.content(), b.content());
    assert_eq!(b.engine.metrics().blends, 1);
}

#[test]
fn test_split_keeps_both_copies() {
    let (mut a, mut b) = replicas(MergeStrategy::Split);
    a.store.fill(a.id, 1.0).unwrap();
    b.store.fill(b.id, 2.0).unwrap();

    let report = b.receive(&a);
    let sibling = report.sibling.unwrap();
    assert_eq!(b.engine.state(b.id), SyncState::Split { sibling });
    assert_eq!(b.store.roots(), &[b.id, sibling]);
    assert!(b.store.buffer(b.id).unwrap().iter().all(|v| *v == 2.0));
    assert!(b.store.buffer(sibling).unwrap().iter().all(|v| *v == 1.0));
    assert_eq!(b.store.get_membrane(sibling).unwrap().version(), 1);
}

#[test]
fn test_remote_shape_outside_local_limits_is_refused() {
    let (mut a, mut b) = replicas(MergeStrategy::LastWriterWins);
    a.store.destroy(a.id).unwrap();
    a.id = a.store.create(shape(&[2; 16])).unwrap();
    a.store.fill(a.id, 1.0).unwrap();

    let mut tight = membrane_core::MembraneConfig::default();
    tight.limits.max_axes = 4;
    let mut store = MembraneStore::with_config(tight);
    let local = store.create(shape(&[2, 3])).unwrap();
    let before = store.get_membrane(local).unwrap().clone();

    let remote = snapshot(&a.store, a.id).unwrap();
    assert!(b.engine.apply_remote(&mut store, local, &remote).is_err());
    assert_eq!(store.get_membrane(local).unwrap(), &before);
}
