//! Membrane store: lifecycle and ownership tree
//!
//! The store is the single owning arena for membranes. Parent links are ids
//! looked up in this arena, so destroying a subtree is a walk over ids with no
//! shared ownership to untangle.
//!
//! Independent stores can coexist. Ids are unique per store and never reused.

use crate::membrane::Membrane;
use membrane_core::{
    BufferInit, CapacityResource, MembraneConfig, MembraneError, MembraneId, MembraneLimits,
    PrimeShape, Result,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Owning arena for membranes and their ownership forest
#[derive(Debug, Clone)]
pub struct MembraneStore {
    pub(crate) config: MembraneConfig,
    pub(crate) membranes: BTreeMap<MembraneId, Membrane>,
    /// Root membranes in creation order
    pub(crate) roots: Vec<MembraneId>,
    next_id: u32,
    rng: ChaCha8Rng,
}

impl MembraneStore {
    /// Create a store with default limits and zero-initialized buffers
    pub fn new() -> Self {
        Self::with_config(MembraneConfig::default())
    }

    /// Create a store with explicit configuration
    pub fn with_config(config: MembraneConfig) -> Self {
        let rng = match config.init {
            BufferInit::Random {
                seed: Some(seed), ..
            } => ChaCha8Rng::seed_from_u64(seed),
            _ => ChaCha8Rng::from_entropy(),
        };
        Self {
            config,
            membranes: BTreeMap::new(),
            roots: Vec::new(),
            next_id: 1,
            rng,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &MembraneConfig {
        &self.config
    }

    /// Active capacity limits
    pub fn limits(&self) -> &MembraneLimits {
        &self.config.limits
    }

    /// Create a root membrane
    pub fn create(&mut self, shape: PrimeShape) -> Result<MembraneId> {
        let id = self.allocate(shape, None)?;
        self.roots.push(id);
        info!(membrane = %id, "Created root membrane");
        Ok(id)
    }

    /// Create a membrane owned by `parent`
    pub fn create_child(&mut self, parent: MembraneId, shape: PrimeShape) -> Result<MembraneId> {
        let limits = &self.config.limits;
        let (max_children, max_depth) = (limits.max_children, limits.max_depth);

        let owner = self.get_membrane(parent)?;
        if owner.children.len() >= max_children as usize {
            return Err(MembraneError::capacity(
                CapacityResource::Children,
                max_children,
            ));
        }
        if self.depth(parent)? >= max_depth {
            return Err(MembraneError::capacity(CapacityResource::Depth, max_depth));
        }

        let id = self.allocate(shape, Some(parent))?;
        self.membrane_mut(parent)?.children.push(id);
        info!(membrane = %id, parent = %parent, "Created child membrane");
        Ok(id)
    }

    /// Destroy a membrane and everything it owns
    ///
    /// Descendants are released in post-order before the membrane itself is
    /// detached from its parent and released. Returns the destroyed ids in
    /// release order, `id` last.
    pub fn destroy(&mut self, id: MembraneId) -> Result<Vec<MembraneId>> {
        let parent = self.get_membrane(id)?.parent;

        let mut released = self.descendants_post_order(id);
        for victim in &released {
            self.membranes.remove(victim);
        }

        match parent {
            Some(parent_id) => {
                if let Some(owner) = self.membranes.get_mut(&parent_id) {
                    owner.children.retain(|child| *child != id);
                }
            }
            None => self.roots.retain(|root| *root != id),
        }
        self.membranes.remove(&id);
        released.push(id);

        info!(membrane = %id, released = released.len(), "Destroyed membrane");
        Ok(released)
    }

    /// Reinterpret the buffer under a shape of equal volume
    pub fn reshape(&mut self, id: MembraneId, new_shape: PrimeShape) -> Result<()> {
        if !self.contains(id) {
            return Err(MembraneError::membrane_not_found(id));
        }
        self.validate_shape(&new_shape)?;
        let membrane = self.membrane_mut(id)?;
        let (from_volume, to_volume) = (membrane.shape.volume(), new_shape.volume());
        if from_volume != to_volume {
            return Err(MembraneError::IncompatibleShape {
                from_volume,
                to_volume,
            });
        }

        debug!(membrane = %id, from = %membrane.shape, to = %new_shape, "Reshaping membrane");
        membrane.shape = new_shape;
        membrane.touch_content();
        Ok(())
    }

    /// Alias of [`reshape`](Self::reshape); volume is invariant so no reallocation happens
    pub fn resize(&mut self, id: MembraneId, new_shape: PrimeShape) -> Result<()> {
        self.reshape(id, new_shape)
    }

    /// Spend energy; fails without spending when the balance is short
    pub fn consume_energy(&mut self, id: MembraneId, amount: u32) -> Result<u32> {
        let membrane = self.membrane_mut(id)?;
        let remaining = membrane
            .energy
            .checked_sub(amount)
            .ok_or_else(|| MembraneError::capacity(CapacityResource::Energy, membrane.energy))?;
        membrane.energy = remaining;
        debug!(membrane = %id, amount, remaining, "Consumed energy");
        Ok(remaining)
    }

    /// Replace shape, buffer and version wholesale
    ///
    /// Used when adopting a remote copy. The caller decides ordering; this only
    /// checks that the content is a valid membrane for this store.
    pub fn install_content(
        &mut self,
        id: MembraneId,
        shape: PrimeShape,
        buffer: Vec<f32>,
        version: u64,
    ) -> Result<()> {
        self.validate_shape(&shape)?;
        if buffer.len() as u64 != shape.volume() {
            return Err(MembraneError::invalid_shape(format!(
                "buffer holds {} elements but {shape} has volume {}",
                buffer.len(),
                shape.volume()
            )));
        }

        let membrane = self.membrane_mut(id)?;
        membrane.shape = shape;
        membrane.buffer = buffer;
        membrane.touch_content();
        membrane.version = version;
        debug!(membrane = %id, version, checksum = membrane.checksum, "Installed content");
        Ok(())
    }

    /// Look up a membrane
    pub fn get_membrane(&self, id: MembraneId) -> Result<&Membrane> {
        self.membranes
            .get(&id)
            .ok_or_else(|| MembraneError::membrane_not_found(id))
    }

    pub(crate) fn membrane_mut(&mut self, id: MembraneId) -> Result<&mut Membrane> {
        self.membranes
            .get_mut(&id)
            .ok_or_else(|| MembraneError::membrane_not_found(id))
    }

    /// Whether `id` is registered
    pub fn contains(&self, id: MembraneId) -> bool {
        self.membranes.contains_key(&id)
    }

    /// Number of live membranes
    pub fn len(&self) -> usize {
        self.membranes.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.membranes.is_empty()
    }

    /// Live ids in allocation order
    pub fn ids(&self) -> impl Iterator<Item = MembraneId> + '_ {
        self.membranes.keys().copied()
    }

    /// Root membranes in creation order
    pub fn roots(&self) -> &[MembraneId] {
        &self.roots
    }

    /// Children of `id` in registration order
    pub fn children(&self, id: MembraneId) -> Result<&[MembraneId]> {
        Ok(&self.get_membrane(id)?.children)
    }

    /// Parent of `id`, if nested
    pub fn parent(&self, id: MembraneId) -> Result<Option<MembraneId>> {
        Ok(self.get_membrane(id)?.parent)
    }

    /// Nesting depth; roots are at depth 1
    pub fn depth(&self, id: MembraneId) -> Result<u32> {
        let mut depth = 1;
        let mut cursor = self.get_membrane(id)?.parent;
        while let Some(parent) = cursor {
            depth += 1;
            cursor = self.get_membrane(parent)?.parent;
        }
        Ok(depth)
    }

    fn allocate(&mut self, shape: PrimeShape, parent: Option<MembraneId>) -> Result<MembraneId> {
        self.validate_shape(&shape)?;
        let max_membranes = self.config.limits.max_membranes;
        if self.membranes.len() >= max_membranes as usize {
            return Err(MembraneError::capacity(
                CapacityResource::Membranes,
                max_membranes,
            ));
        }

        let id = MembraneId::new(self.next_id);
        self.next_id = self
            .next_id
            .checked_add(1)
            .ok_or_else(|| MembraneError::capacity(CapacityResource::Membranes, u32::MAX))?;

        let buffer = self.initial_buffer(shape.volume() as usize);
        let membrane = Membrane::new(
            id,
            shape,
            buffer,
            self.config.limits.initial_energy,
            parent,
        );
        self.membranes.insert(id, membrane);
        Ok(id)
    }

    fn initial_buffer(&mut self, len: usize) -> Vec<f32> {
        match self.config.init {
            BufferInit::Zeros => vec![0.0; len],
            BufferInit::Random { scale, .. } => {
                (0..len).map(|_| self.rng.gen::<f32>() * scale).collect()
            }
        }
    }

    /// Checks that apply to any shape a membrane may take
    pub(crate) fn validate_shape(&self, shape: &PrimeShape) -> Result<()> {
        let limits = &self.config.limits;
        if shape.is_empty() {
            return Err(MembraneError::invalid_shape(
                "a membrane shape needs at least one axis",
            ));
        }
        if shape.rank() > limits.max_axes as usize {
            return Err(MembraneError::invalid_shape(format!(
                "{} axes exceeds the maximum of {}",
                shape.rank(),
                limits.max_axes
            )));
        }
        if shape.volume() > limits.max_volume {
            return Err(MembraneError::capacity(
                CapacityResource::Volume,
                limits.max_volume,
            ));
        }
        Ok(())
    }

    /// Strict descendants of `id`, children before their parents
    fn descendants_post_order(&self, id: MembraneId) -> Vec<MembraneId> {
        let mut order = Vec::new();
        let mut stack: Vec<(MembraneId, bool)> = self
            .membranes
            .get(&id)
            .map(|m| m.children.iter().rev().map(|c| (*c, false)).collect())
            .unwrap_or_default();

        while let Some((current, expanded)) = stack.pop() {
            if expanded {
                order.push(current);
                continue;
            }
            stack.push((current, true));
            if let Some(membrane) = self.membranes.get(&current) {
                stack.extend(membrane.children.iter().rev().map(|c| (*c, false)));
            }
        }
        order
    }
}

impl Default for MembraneStore {
    fn default() -> Self {
        Self::new()
    }
}
