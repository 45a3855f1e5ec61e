//! Property test strategies for membrane types
//!
//! Shapes are kept small (few axes, small primes) so generated buffers stay
//! cheap while still covering repeats and mixed layouts.

use proptest::prelude::*;

// Re-export proptest for convenience
pub use proptest;

use membrane_core::{MembraneId, PrimeShape};
use membrane_sync::SyncSnapshot;

const SMALL_PRIMES: [u32; 6] = [2, 3, 5, 7, 11, 13];

/// Strategy for one small prime
pub fn arb_prime() -> impl Strategy<Value = u32> {
    prop::sample::select(SMALL_PRIMES.to_vec())
}

/// Strategy for a non-empty shape of up to `max_rank` small primes
///
/// # Example
///
/// ```rust
/// use membrane_testkit::strategies::arb_prime_shape;
/// use proptest::prelude::*;
///
/// proptest! {
///     #[test]
///     fn test_shape_property(shape in arb_prime_shape(4)) {
///         assert!(shape.is_prime_factored());
///     }
/// }
/// ```
pub fn arb_prime_shape(max_rank: usize) -> impl Strategy<Value = PrimeShape> {
    prop::collection::vec(arb_prime(), 1..=max_rank.max(1))
        .prop_map(|factors| PrimeShape::new(factors).expect("small primes form a valid shape"))
}

/// Strategy for a buffer filling `shape`
pub fn arb_buffer_for(shape: &PrimeShape) -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(-100.0f32..100.0, shape.volume() as usize)
}

/// Strategy for a valid index into `shape`
pub fn arb_index_for(shape: &PrimeShape) -> impl Strategy<Value = Vec<u32>> {
    shape
        .factors()
        .iter()
        .map(|&size| 0..size)
        .collect::<Vec<_>>()
}

/// Strategy for a self-consistent snapshot
pub fn arb_snapshot() -> impl Strategy<Value = SyncSnapshot> {
    (1u32..8, arb_prime_shape(3), 1u64..50).prop_flat_map(|(id, shape, version)| {
        arb_buffer_for(&shape).prop_map(move |buffer| {
            SyncSnapshot::from_content(MembraneId::new(id), shape.clone(), version, buffer)
        })
    })
}

/// Strategy for two snapshots of one membrane at the same version
///
/// Content is generated independently, so the pair is usually in conflict.
pub fn arb_tied_pair() -> impl Strategy<Value = (SyncSnapshot, SyncSnapshot)> {
    (1u32..8, arb_prime_shape(3), 1u64..50).prop_flat_map(|(id, shape, version)| {
        (arb_buffer_for(&shape), arb_buffer_for(&shape)).prop_map(move |(a, b)| {
            let id = MembraneId::new(id);
            (
                SyncSnapshot::from_content(id, shape.clone(), version, a),
                SyncSnapshot::from_content(id, shape.clone(), version, b),
            )
        })
    })
}
