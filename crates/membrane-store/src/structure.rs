//! Textual rendering of the ownership forest
//!
//! Output is deterministic: children appear in registration order and objects
//! in insertion order.
//!
//! ```text
//! Membrane 1: [2,3] energy=100 objects=1 children=1
//!   obj: glucose
//!   Membrane 2: [5] energy=100 objects=0 children=0
//! ```

use crate::store::MembraneStore;
use membrane_core::{MembraneId, Result};

impl MembraneStore {
    /// Render one membrane and its subtree
    pub fn render_structure(&self, id: MembraneId) -> Result<String> {
        let mut out = String::new();
        let mut stack = vec![(id, 0usize)];

        while let Some((current, depth)) = stack.pop() {
            let membrane = self.get_membrane(current)?;
            let indent = "  ".repeat(depth);
            out.push_str(&format!(
                "{indent}Membrane {}: {} energy={} objects={} children={}\n",
                current.value(),
                membrane.shape(),
                membrane.energy(),
                membrane.object_count(),
                membrane.children().len()
            ));
            for symbol in membrane.objects() {
                out.push_str(&format!("{indent}  obj: {symbol}\n"));
            }
            stack.extend(membrane.children().iter().rev().map(|c| (*c, depth + 1)));
        }

        Ok(out)
    }

    /// Render every root in creation order
    pub fn render_forest(&self) -> String {
        self.roots
            .iter()
            .filter_map(|root| self.render_structure(*root).ok())
            .collect()
    }
}
