//! Property-Based Tests for snapshot merging
//!
//! ## Properties Verified
//!
//! - A strictly greater version never yields a conflict
//! - Equal versions with different checksums always yield a conflict
//! - Last-writer-wins and blend pick the same content on both replicas
//! - Merged snapshots always verify

use membrane_sync::{compare, merge, MergeStrategy, SyncAction, SyncComparison, SyncSnapshot};
use membrane_testkit::strategies::{arb_snapshot, arb_tied_pair, proptest};
use proptest::prelude::*;

proptest! {
    /// Property: version order decides whenever versions differ
    #[test]
    fn prop_newer_version_never_conflicts(a in arb_snapshot(), b in arb_snapshot()) {
        prop_assume!(a.version != b.version);
        let comparison = compare(&a, &b);

        prop_assert_ne!(comparison, SyncComparison::Conflict);
        if a.version > b.version {
            prop_assert_eq!(comparison, SyncComparison::LocalNewer);
        } else {
            prop_assert_eq!(comparison, SyncComparison::RemoteNewer);
        }
    }

    /// Property: tied versions conflict exactly when checksums differ
    #[test]
    fn prop_tied_versions((a, b) in arb_tied_pair()) {
        let expected = if a.checksum == b.checksum {
            SyncComparison::Equal
        } else {
            SyncComparison::Conflict
        };
        prop_assert_eq!(compare(&a, &b), expected);
    }

    /// Property: both replicas converge under last-writer-wins
    #[test]
    fn prop_lww_converges((a, b) in arb_tied_pair()) {
        let on_a = merge(&a, &b, None);
        let on_b = merge(&b, &a, None);

        prop_assert_eq!(on_a.merged.checksum, on_b.merged.checksum);
        prop_assert_eq!(on_a.merged.version, on_b.merged.version);
        prop_assert_eq!(&on_a.merged.buffer, &on_b.merged.buffer);
    }

    /// Property: both replicas converge under blend
    #[test]
    fn prop_blend_converges((a, b) in arb_tied_pair()) {
        let on_a = merge(&a, &b, Some(MergeStrategy::Blend));
        let on_b = merge(&b, &a, Some(MergeStrategy::Blend));

        prop_assert_eq!(on_a.merged.checksum, on_b.merged.checksum);
        prop_assert_eq!(on_a.merged.version, on_b.merged.version);
    }

    /// Property: merge output is always a valid snapshot
    #[test]
    fn prop_merged_snapshot_verifies(
        a in arb_snapshot(),
        b in arb_snapshot(),
        strategy in prop_oneof![
            Just(MergeStrategy::LastWriterWins),
            Just(MergeStrategy::Blend),
            Just(MergeStrategy::Split),
        ]
    ) {
        let outcome = merge(&a, &b, Some(strategy));
        prop_assert!(outcome.merged.verify().is_ok());
        prop_assert_eq!(outcome.merged.membrane_id, a.membrane_id);
        if outcome.action == SyncAction::Reject {
            prop_assert_eq!(&outcome.merged, &a);
        }
    }

    /// Property: a stale remote never changes local content
    #[test]
    fn prop_stale_remote_is_rejected(local in arb_snapshot(), remote in arb_snapshot()) {
        prop_assume!(local.version > remote.version);
        let outcome = merge(&local, &remote, Some(MergeStrategy::Blend));
        prop_assert!(!outcome.local_changed);
        prop_assert_eq!(outcome.merged, local);
    }
}

#[test]
fn test_equal_snapshots_accept_without_change() {
    let snap = SyncSnapshot::from_content(
        membrane_core::MembraneId::new(1),
        membrane_testkit::shape(&[3]),
        2,
        vec![1.0, 2.0, 3.0],
    );
    let outcome = merge(&snap, &snap.clone(), Some(MergeStrategy::Split));
    assert_eq!(outcome.comparison, SyncComparison::Equal);
    assert_eq!(outcome.action, SyncAction::Accept);
    assert!(!outcome.local_changed);
    assert!(outcome.split.is_none());
}
