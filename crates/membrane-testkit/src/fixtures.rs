//! Store fixtures

use membrane_core::{MembraneId, PrimeShape};
use membrane_store::MembraneStore;

/// Build a shape, panicking on invalid factors
pub fn shape(factors: &[u32]) -> PrimeShape {
    PrimeShape::from_slice(factors).expect("test shape must be valid")
}

/// A root with two children, one of which holds an object
///
/// ```text
/// root [2,3,5] (glucose)
/// ├── left  [2,2,3]
/// └── right [7]
/// ```
#[derive(Debug, Clone)]
pub struct TreeFixture {
    /// Store holding the tree
    pub store: MembraneStore,
    /// Root membrane
    pub root: MembraneId,
    /// First child
    pub left: MembraneId,
    /// Second child
    pub right: MembraneId,
}

impl TreeFixture {
    /// Build the tree in a default store
    pub fn new() -> Self {
        Self::in_store(MembraneStore::new())
    }

    /// Build the tree in the given store
    pub fn in_store(mut store: MembraneStore) -> Self {
        let root = store.create(shape(&[2, 3, 5])).unwrap();
        let left = store.create_child(root, shape(&[2, 2, 3])).unwrap();
        let right = store.create_child(root, shape(&[7])).unwrap();
        store.add_object(root, "glucose").unwrap();
        Self {
            store,
            root,
            left,
            right,
        }
    }
}

impl Default for TreeFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Two stores each holding one root membrane of the same shape
///
/// Stand-in for two replicas of one membrane. Both start at version 1 with
/// identical zeroed content.
pub fn replica_pair(factors: &[u32]) -> ((MembraneStore, MembraneId), (MembraneStore, MembraneId)) {
    let mut a = MembraneStore::new();
    let mut b = MembraneStore::new();
    let id_a = a.create(shape(factors)).unwrap();
    let id_b = b.create(shape(factors)).unwrap();
    ((a, id_a), (b, id_b))
}
