//! Element access on membrane buffers

use crate::store::MembraneStore;
use membrane_core::{MembraneId, Result};
use tracing::debug;

impl MembraneStore {
    /// Read the element at `indices` (one index per axis, row-major)
    pub fn get(&self, id: MembraneId, indices: &[u32]) -> Result<f32> {
        let membrane = self.get_membrane(id)?;
        let offset = membrane.shape.flat_offset(indices)?;
        Ok(membrane.buffer[offset])
    }

    /// Write the element at `indices`
    pub fn set(&mut self, id: MembraneId, indices: &[u32], value: f32) -> Result<()> {
        let membrane = self.membrane_mut(id)?;
        let offset = membrane.shape.flat_offset(indices)?;
        membrane.buffer[offset] = value;
        membrane.touch_content();
        debug!(membrane = %id, offset, value, version = membrane.version, "Set element");
        Ok(())
    }

    /// Write `value` into every element; one version bump for the whole fill
    pub fn fill(&mut self, id: MembraneId, value: f32) -> Result<()> {
        let membrane = self.membrane_mut(id)?;
        membrane.buffer.fill(value);
        membrane.touch_content();
        debug!(membrane = %id, value, version = membrane.version, "Filled membrane");
        Ok(())
    }

    /// Elements of `id` in flat order
    pub fn buffer(&self, id: MembraneId) -> Result<&[f32]> {
        Ok(self.get_membrane(id)?.buffer())
    }
}
