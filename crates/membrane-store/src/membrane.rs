//! The membrane entity
//!
//! A membrane is a shaped `f32` buffer plus a set of symbolic objects, placed
//! in an ownership forest. Parent and children are ids resolved through the
//! owning [`MembraneStore`](crate::MembraneStore); a membrane never holds a
//! reference to another membrane.

use indexmap::IndexSet;
use membrane_core::{content_checksum, MembraneId, PrimeShape};

/// A shaped, versioned buffer with its P-system objects
#[derive(Debug, Clone, PartialEq)]
pub struct Membrane {
    pub(crate) id: MembraneId,
    pub(crate) shape: PrimeShape,
    pub(crate) buffer: Vec<f32>,
    pub(crate) version: u64,
    pub(crate) checksum: u32,
    pub(crate) energy: u32,
    /// Distinct symbols in insertion order
    pub(crate) objects: IndexSet<String>,
    pub(crate) parent: Option<MembraneId>,
    /// Owned children in registration order
    pub(crate) children: Vec<MembraneId>,
    pub(crate) operation_count: u64,
}

impl Membrane {
    pub(crate) fn new(
        id: MembraneId,
        shape: PrimeShape,
        buffer: Vec<f32>,
        energy: u32,
        parent: Option<MembraneId>,
    ) -> Self {
        let checksum = content_checksum(&shape, &buffer);
        Self {
            id,
            shape,
            buffer,
            version: 1,
            checksum,
            energy,
            objects: IndexSet::new(),
            parent,
            children: Vec::new(),
            operation_count: 0,
        }
    }

    /// Identifier within the owning store
    pub fn id(&self) -> MembraneId {
        self.id
    }

    /// Current shape
    pub fn shape(&self) -> &PrimeShape {
        &self.shape
    }

    /// Elements in flat row-major order
    pub fn buffer(&self) -> &[f32] {
        &self.buffer
    }

    /// Mutation counter, starting at 1
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Checksum over shape and buffer
    pub fn checksum(&self) -> u32 {
        self.checksum
    }

    /// Remaining energy
    pub fn energy(&self) -> u32 {
        self.energy
    }

    /// Owning membrane, if nested
    pub fn parent(&self) -> Option<MembraneId> {
        self.parent
    }

    /// Owned children in registration order
    pub fn children(&self) -> &[MembraneId] {
        &self.children
    }

    /// Whether this membrane has no parent
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Symbols in insertion order
    pub fn objects(&self) -> impl Iterator<Item = &str> {
        self.objects.iter().map(String::as_str)
    }

    /// Number of distinct symbols held
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Whether the symbol is present
    pub fn has_object(&self, symbol: &str) -> bool {
        self.objects.contains(symbol)
    }

    /// Multiplicity of a symbol; presence is boolean so this is 0 or 1
    pub fn multiplicity(&self, symbol: &str) -> u32 {
        u32::from(self.has_object(symbol))
    }

    /// Successful mutations applied since creation
    pub fn operation_count(&self) -> u64 {
        self.operation_count
    }

    /// Record a mutation of the buffer or shape.
    pub(crate) fn touch_content(&mut self) {
        self.checksum = content_checksum(&self.shape, &self.buffer);
        self.touch_metadata();
    }

    /// Record a mutation that leaves the checksummed content alone.
    pub(crate) fn touch_metadata(&mut self) {
        self.version += 1;
        self.operation_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn membrane() -> Membrane {
        let shape = PrimeShape::new(vec![2, 3]).unwrap();
        Membrane::new(MembraneId::new(1), shape, vec![0.0; 6], 100, None)
    }

    #[test]
    fn test_new_membrane_state() {
        let m = membrane();
        assert_eq!(m.version(), 1);
        assert_eq!(m.energy(), 100);
        assert!(m.is_root());
        assert_eq!(m.object_count(), 0);
        assert_eq!(m.checksum(), content_checksum(m.shape(), m.buffer()));
    }

    #[test]
    fn test_touch_content_refreshes_checksum() {
        let mut m = membrane();
        let before = m.checksum();
        m.buffer[0] = 2.0;
        m.touch_content();
        assert_ne!(m.checksum(), before);
        assert_eq!(m.version(), 2);
        assert_eq!(m.operation_count(), 1);
    }

    #[test]
    fn test_touch_metadata_keeps_checksum() {
        let mut m = membrane();
        let before = m.checksum();
        m.touch_metadata();
        assert_eq!(m.checksum(), before);
        assert_eq!(m.version(), 2);
    }
}
