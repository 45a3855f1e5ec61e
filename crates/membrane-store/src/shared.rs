//! Thread-safe handle around a [`MembraneStore`]
//!
//! Every mutating operation takes the write lock for its whole duration, so
//! a membrane's version/checksum pair is never observed half-updated. Reads
//! share the lock.

use crate::store::MembraneStore;
use membrane_core::{MembraneConfig, MembraneId, PrimeShape, Result};
use parking_lot::RwLock;
use std::sync::Arc;

/// Cloneable, lock-protected store handle
#[derive(Debug, Clone, Default)]
pub struct SharedMembraneStore {
    inner: Arc<RwLock<MembraneStore>>,
}

impl SharedMembraneStore {
    /// Wrap an existing store
    pub fn new(store: MembraneStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    /// Fresh store built from `config`
    pub fn with_config(config: MembraneConfig) -> Self {
        Self::new(MembraneStore::with_config(config))
    }

    /// Run `f` under the read lock
    pub fn read<R>(&self, f: impl FnOnce(&MembraneStore) -> R) -> R {
        f(&self.inner.read())
    }

    /// Run `f` under the read lock if no writer holds it
    pub fn try_read<R>(&self, f: impl FnOnce(&MembraneStore) -> R) -> Option<R> {
        self.inner.try_read().map(|store| f(&store))
    }

    /// Run `f` under the write lock
    pub fn write<R>(&self, f: impl FnOnce(&mut MembraneStore) -> R) -> R {
        f(&mut self.inner.write())
    }

    /// See [`MembraneStore::create`]
    pub fn create(&self, shape: PrimeShape) -> Result<MembraneId> {
        self.write(|store| store.create(shape))
    }

    /// See [`MembraneStore::create_child`]
    pub fn create_child(&self, parent: MembraneId, shape: PrimeShape) -> Result<MembraneId> {
        self.write(|store| store.create_child(parent, shape))
    }

    /// See [`MembraneStore::destroy`]
    pub fn destroy(&self, id: MembraneId) -> Result<Vec<MembraneId>> {
        self.write(|store| store.destroy(id))
    }

    /// See [`MembraneStore::reshape`]
    pub fn reshape(&self, id: MembraneId, shape: PrimeShape) -> Result<()> {
        self.write(|store| store.reshape(id, shape))
    }

    /// See [`MembraneStore::get`]
    pub fn get(&self, id: MembraneId, indices: &[u32]) -> Result<f32> {
        self.read(|store| store.get(id, indices))
    }

    /// See [`MembraneStore::set`]
    pub fn set(&self, id: MembraneId, indices: &[u32], value: f32) -> Result<()> {
        self.write(|store| store.set(id, indices, value))
    }

    /// See [`MembraneStore::fill`]
    pub fn fill(&self, id: MembraneId, value: f32) -> Result<()> {
        self.write(|store| store.fill(id, value))
    }

    /// See [`MembraneStore::add_object`]
    pub fn add_object(&self, id: MembraneId, symbol: &str) -> Result<()> {
        self.write(|store| store.add_object(id, symbol))
    }

    /// See [`MembraneStore::transfer_object`]
    pub fn transfer_object(&self, from: MembraneId, to: MembraneId, symbol: &str) -> Result<()> {
        self.write(|store| store.transfer_object(from, to, symbol))
    }

    /// Version and checksum read together under one lock
    pub fn version_and_checksum(&self, id: MembraneId) -> Result<(u64, u32)> {
        self.read(|store| {
            let membrane = store.get_membrane(id)?;
            Ok((membrane.version(), membrane.checksum()))
        })
    }
}

impl From<MembraneStore> for SharedMembraneStore {
    fn from(store: MembraneStore) -> Self {
        Self::new(store)
    }
}
