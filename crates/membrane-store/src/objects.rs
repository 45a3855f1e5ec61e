//! P-system object operations
//!
//! Each membrane holds a set of symbols. Presence is boolean: adding a symbol
//! that is already there succeeds without change.

use crate::store::MembraneStore;
use membrane_core::{CapacityResource, MembraneError, MembraneId, Result};
use tracing::debug;

impl MembraneStore {
    /// Insert `symbol`; a present symbol is left as is
    pub fn add_object(&mut self, id: MembraneId, symbol: &str) -> Result<()> {
        validate_symbol(symbol)?;
        let max_objects = self.config.limits.max_objects;
        let membrane = self.membrane_mut(id)?;

        if membrane.objects.contains(symbol) {
            return Ok(());
        }
        if membrane.objects.len() >= max_objects as usize {
            return Err(MembraneError::capacity(
                CapacityResource::Objects,
                max_objects,
            ));
        }

        membrane.objects.insert(symbol.to_string());
        membrane.touch_metadata();
        debug!(membrane = %id, symbol, "Added object");
        Ok(())
    }

    /// Remove `symbol`, keeping the order of the remaining symbols
    pub fn remove_object(&mut self, id: MembraneId, symbol: &str) -> Result<()> {
        let membrane = self.membrane_mut(id)?;
        if !membrane.objects.shift_remove(symbol) {
            return Err(MembraneError::object_not_found(id, symbol));
        }
        membrane.touch_metadata();
        debug!(membrane = %id, symbol, "Removed object");
        Ok(())
    }

    /// Whether `symbol` is present in `id`
    pub fn find_object(&self, id: MembraneId, symbol: &str) -> Result<bool> {
        Ok(self.get_membrane(id)?.has_object(symbol))
    }

    /// Symbols held by `id` in insertion order
    pub fn objects(&self, id: MembraneId) -> Result<Vec<String>> {
        Ok(self.get_membrane(id)?.objects().map(str::to_string).collect())
    }

    /// Move `symbol` from one membrane to another
    ///
    /// All preconditions are checked before either membrane is touched, so a
    /// failed transfer leaves both exactly as they were.
    pub fn transfer_object(&mut self, from: MembraneId, to: MembraneId, symbol: &str) -> Result<()> {
        validate_symbol(symbol)?;
        let max_objects = self.config.limits.max_objects as usize;

        let source = self.get_membrane(from)?;
        let target = self.get_membrane(to)?;
        if !source.has_object(symbol) {
            return Err(MembraneError::object_not_found(from, symbol));
        }
        if from == to {
            return Ok(());
        }

        let target_has = target.has_object(symbol);
        if !target_has && target.object_count() >= max_objects {
            return Err(MembraneError::capacity(
                CapacityResource::Objects,
                max_objects as u64,
            ));
        }

        let target = self.membrane_mut(to)?;
        if !target_has {
            target.objects.insert(symbol.to_string());
            target.touch_metadata();
        }
        let source = self.membrane_mut(from)?;
        source.objects.shift_remove(symbol);
        source.touch_metadata();

        debug!(from = %from, to = %to, symbol, "Transferred object");
        Ok(())
    }
}

fn validate_symbol(symbol: &str) -> Result<()> {
    if symbol.trim().is_empty() {
        return Err(MembraneError::InvalidSymbol {
            reason: "symbol must contain a non-blank character".to_string(),
        });
    }
    Ok(())
}
