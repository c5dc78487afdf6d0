// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Topology key types for arena-based storage.
//!
//! Each topology entity gets a unique, type-safe key for O(1) lookup in the
//! arena. Keys are created by `slotmap::SlotMap` and remain valid even after
//! other entities are removed (generational indices).

use slotmap::new_key_type;

new_key_type! {
    /// Key for a node (point in the plane).
    pub struct NodeKey;

    /// Key for an edge (simple curve between two nodes).
    pub struct EdgeKey;

    /// Key for a face (region of the planar subdivision).
    pub struct FaceKey;
}

/// A directed edge-end: an edge paired with a traversal direction.
///
/// `forward == true` traverses the edge start→end, `false` traverses
/// end→start. Edge-ends are the atomic unit linked by next-pointers into
/// the circular rings that bound faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeEnd {
    pub edge: EdgeKey,
    pub forward: bool,
}

impl EdgeEnd {
    /// Forward-directed end of an edge (start→end traversal).
    pub fn forward(edge: EdgeKey) -> Self {
        Self { edge, forward: true }
    }

    /// Backward-directed end of an edge (end→start traversal).
    pub fn backward(edge: EdgeKey) -> Self {
        Self {
            edge,
            forward: false,
        }
    }

    /// The same edge traversed the opposite way.
    pub fn reversed(self) -> Self {
        Self {
            edge: self.edge,
            forward: !self.forward,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn edge_end_reversal() {
        let mut sm: SlotMap<EdgeKey, ()> = SlotMap::with_key();
        let e = sm.insert(());

        let fwd = EdgeEnd::forward(e);
        let bwd = EdgeEnd::backward(e);
        assert_eq!(fwd.reversed(), bwd);
        assert_eq!(bwd.reversed(), fwd);
        assert_ne!(fwd, bwd);
        assert_eq!(fwd.edge, bwd.edge);
    }
}
