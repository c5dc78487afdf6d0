// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Arena-based storage for planar topology entities.
//!
//! The [`Topology`] is the exclusive owner of all nodes, edges and faces.
//! Entities live in slot maps with stable, generational keys; one spatial
//! index per registry supports proximity and crossing queries, and a
//! node→edges adjacency map supports upward traversal. External callers
//! hold only keys and mutate the structure exclusively through the edit
//! operations, which keeps the planar invariants local to this crate.

use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::SlotMap;

use crate::error::{Error, Result};
use crate::events::{Event, EventKind, ObserverId, ObserverTable};
use crate::geom::{self, Coord, Rect};
use crate::keys::{EdgeEnd, EdgeKey, FaceKey, NodeKey};
use crate::spatial::RectIndex;

/// Data stored for a node: a point in the plane.
///
/// `containing_face` is set iff the node is isolated (incident to no edge);
/// it names the face whose interior holds the node.
#[derive(Debug, Clone)]
pub struct NodeData {
    pub coord: Coord,
    pub containing_face: Option<FaceKey>,
}

/// Data stored for an edge: a simple curve between two nodes.
///
/// The coordinate sequence starts at the start node's coordinate and ends at
/// the end node's, exactly. `next_left` continues the ring along the left
/// face when the edge is traversed forward; `next_right` continues the ring
/// along the right face when traversed backward.
#[derive(Debug, Clone)]
pub struct EdgeData {
    pub start: NodeKey,
    pub end: NodeKey,
    pub coords: Vec<Coord>,
    pub next_left: EdgeEnd,
    pub next_right: EdgeEnd,
    pub left_face: FaceKey,
    pub right_face: FaceKey,
}

impl EdgeData {
    /// Next edge-end in the ring when this edge is traversed in the given
    /// direction.
    pub fn next(&self, forward: bool) -> EdgeEnd {
        if forward {
            self.next_left
        } else {
            self.next_right
        }
    }

    pub(crate) fn set_next(&mut self, forward: bool, next: EdgeEnd) {
        if forward {
            self.next_left = next;
        } else {
            self.next_right = next;
        }
    }

    /// Bounding box of the edge curve.
    pub fn rect(&self) -> Rect {
        Rect::of_coords(&self.coords).expect("edge has at least two coordinates")
    }
}

/// Data stored for a face. Faces carry no geometry; the boundary is derived
/// on demand from the edges naming the face. The MBR is kept only for the
/// spatial index and is `None` for the unbounded universe face.
#[derive(Debug, Clone)]
pub struct FaceData {
    pub mbr: Option<Rect>,
}

/// A named planar topology: registries, spatial indexes and observers.
pub struct Topology {
    pub name: String,
    pub srid: i32,
    pub tolerance: f64,

    pub(crate) nodes: SlotMap<NodeKey, NodeData>,
    pub(crate) edges: SlotMap<EdgeKey, EdgeData>,
    pub(crate) faces: SlotMap<FaceKey, FaceData>,

    pub(crate) node_index: RectIndex<NodeKey>,
    pub(crate) edge_index: RectIndex<EdgeKey>,
    pub(crate) face_index: RectIndex<FaceKey>,

    // Upward adjacency: node → incident edges.
    pub(crate) node_to_edges: FxHashMap<NodeKey, FxHashSet<EdgeKey>>,

    universe: FaceKey,
    observers: ObserverTable,
}

impl std::fmt::Debug for Topology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Topology")
            .field("name", &self.name)
            .field("srid", &self.srid)
            .field("tolerance", &self.tolerance)
            .field("nodes", &self.nodes.len())
            .field("edges", &self.edges.len())
            .field("faces", &self.faces.len())
            .finish()
    }
}

impl Topology {
    /// Creates an empty topology containing only the universe face.
    pub fn new(name: impl Into<String>, srid: i32, tolerance: f64) -> Self {
        let mut faces = SlotMap::with_key();
        let universe = faces.insert(FaceData { mbr: None });
        let cell = if tolerance > 0.0 { tolerance * 64.0 } else { 1.0 };
        Self {
            name: name.into(),
            srid,
            tolerance: tolerance.max(0.0),
            nodes: SlotMap::with_key(),
            edges: SlotMap::with_key(),
            faces,
            node_index: RectIndex::new(cell),
            edge_index: RectIndex::new(cell),
            face_index: RectIndex::new(cell),
            node_to_edges: FxHashMap::default(),
            universe,
            observers: ObserverTable::default(),
        }
    }

    /// The distinguished unbounded exterior face. Always exists.
    pub fn universe(&self) -> FaceKey {
        self.universe
    }

    // --- Observers ---

    /// Registers an observer for one lifecycle event kind.
    pub fn on(&mut self, kind: EventKind, callback: Box<dyn FnMut(&Event)>) -> ObserverId {
        self.observers.on(kind, callback)
    }

    /// Unregisters an observer.
    pub fn un(&mut self, id: ObserverId) {
        self.observers.un(id);
    }

    pub(crate) fn emit(&mut self, event: Event) {
        self.observers.emit(&event);
    }

    // --- Accessors ---

    pub fn node(&self, key: NodeKey) -> Option<&NodeData> {
        self.nodes.get(key)
    }

    pub fn edge(&self, key: EdgeKey) -> Option<&EdgeData> {
        self.edges.get(key)
    }

    pub fn face(&self, key: FaceKey) -> Option<&FaceData> {
        self.faces.get(key)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of faces, universe included.
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn node_keys(&self) -> impl Iterator<Item = NodeKey> + '_ {
        self.nodes.keys()
    }

    pub fn edge_keys(&self) -> impl Iterator<Item = EdgeKey> + '_ {
        self.edges.keys()
    }

    pub fn face_keys(&self) -> impl Iterator<Item = FaceKey> + '_ {
        self.faces.keys()
    }

    /// Edges incident to a node, in arbitrary order.
    pub fn incident_edges(&self, node: NodeKey) -> Vec<EdgeKey> {
        self.node_to_edges
            .get(&node)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of edge-ends attached to a node. A closed edge counts twice.
    pub fn node_degree(&self, node: NodeKey) -> usize {
        self.node_to_edges
            .get(&node)
            .map(|set| {
                set.iter()
                    .map(|&e| {
                        let edge = &self.edges[e];
                        if edge.start == node && edge.end == node {
                            2
                        } else {
                            1
                        }
                    })
                    .sum()
            })
            .unwrap_or(0)
    }

    // --- Registry mutation (crate-internal; edit operations call these) ---

    pub(crate) fn insert_node(&mut self, data: NodeData) -> NodeKey {
        let rect = Rect::point(data.coord);
        let key = self.nodes.insert(data);
        self.node_index.insert(key, rect);
        self.emit(Event::AddNode(key));
        key
    }

    pub(crate) fn delete_node(&mut self, key: NodeKey) -> Result<()> {
        self.nodes.remove(key).ok_or(Error::NodeNotFound(key))?;
        self.node_index.remove(key);
        self.node_to_edges.remove(&key);
        self.emit(Event::RemoveNode(key));
        Ok(())
    }

    pub(crate) fn insert_edge_with(
        &mut self,
        build: impl FnOnce(EdgeKey) -> EdgeData,
    ) -> EdgeKey {
        let key = self.edges.insert_with_key(build);
        let (start, end, rect) = {
            let e = &self.edges[key];
            (e.start, e.end, e.rect())
        };
        self.node_to_edges.entry(start).or_default().insert(key);
        self.node_to_edges.entry(end).or_default().insert(key);
        self.edge_index.insert(key, rect);
        self.emit(Event::AddEdge(key));
        key
    }

    pub(crate) fn delete_edge(&mut self, key: EdgeKey) -> Result<()> {
        let data = self.edges.remove(key).ok_or(Error::EdgeNotFound(key))?;
        for node in [data.start, data.end] {
            if let Some(set) = self.node_to_edges.get_mut(&node) {
                set.remove(&key);
                if set.is_empty() {
                    self.node_to_edges.remove(&node);
                }
            }
        }
        self.edge_index.remove(key);
        self.emit(Event::RemoveEdge(key));
        Ok(())
    }

    /// Re-indexes an edge after its coordinate sequence changed and emits
    /// `modedge`.
    pub(crate) fn edge_modified(&mut self, key: EdgeKey) {
        let rect = self.edges[key].rect();
        self.edge_index.insert(key, rect);
        self.emit(Event::ModEdge(key));
    }

    pub(crate) fn insert_face(&mut self, mbr: Option<Rect>) -> FaceKey {
        let key = self.faces.insert(FaceData { mbr });
        if let Some(rect) = mbr {
            self.face_index.insert(key, rect);
        }
        self.emit(Event::AddFace(key));
        key
    }

    pub(crate) fn delete_face(&mut self, key: FaceKey) -> Result<()> {
        debug_assert_ne!(key, self.universe, "universe face is never deleted");
        self.faces.remove(key).ok_or(Error::FaceNotFound(key))?;
        self.face_index.remove(key);
        self.emit(Event::RemoveFace(key));
        Ok(())
    }

    /// Replaces a face's MBR, re-indexes it and emits `modface`.
    pub(crate) fn face_modified(&mut self, key: FaceKey, mbr: Option<Rect>) {
        if let Some(face) = self.faces.get_mut(key) {
            face.mbr = mbr;
            match mbr {
                Some(rect) => self.face_index.insert(key, rect),
                None => self.face_index.remove(key),
            }
            self.emit(Event::ModFace(key));
        }
    }

    // --- Spatial queries ---

    /// The node at the given point, if any.
    ///
    /// The coincident-node rule guarantees at most one node per location;
    /// finding two is structural damage and reported as fatal.
    pub fn find_node_at_point(&self, coord: Coord) -> Result<Option<NodeKey>> {
        let window = Rect::point(coord).expanded(self.tolerance);
        let mut found = None;
        for key in self.node_index.search(window) {
            let node = &self.nodes[key];
            if geom::distance(coord, std::slice::from_ref(&node.coord)) <= self.tolerance
                || node.coord == coord
            {
                if found.is_some() {
                    return Err(Error::CorruptedTopology(format!(
                        "two nodes at ({}, {})",
                        coord.x, coord.y
                    )));
                }
                found = Some(key);
            }
        }
        Ok(found)
    }

    /// Nodes whose locations fall in the window.
    pub fn nodes_in_window(&self, window: Rect) -> Vec<NodeKey> {
        self.node_index.search(window)
    }

    /// Edges whose bounding boxes intersect the window.
    pub fn edges_in_window(&self, window: Rect) -> Vec<EdgeKey> {
        self.edge_index.search(window)
    }

    /// Edges in the window whose curves satisfy a kernel predicate.
    pub fn edges_in_window_where(
        &self,
        window: Rect,
        predicate: impl Fn(&[Coord]) -> bool,
    ) -> Vec<EdgeKey> {
        self.edge_index
            .search(window)
            .into_iter()
            .filter(|&k| predicate(&self.edges[k].coords))
            .collect()
    }

    /// Bounded faces whose MBRs intersect the window.
    pub fn faces_in_window(&self, window: Rect) -> Vec<FaceKey> {
        self.face_index.search(window)
    }

    /// Edges that name the face as left or right face.
    ///
    /// Uses the face MBR to narrow the scan when available; the unbounded
    /// universe face falls back to a full pass.
    pub fn edges_bound_by_face(&self, face: FaceKey) -> Vec<EdgeKey> {
        let candidates: Vec<EdgeKey> = match self.faces.get(face).and_then(|f| f.mbr) {
            Some(mbr) => self.edge_index.search(mbr),
            None => self.edges.keys().collect(),
        };
        candidates
            .into_iter()
            .filter(|&k| {
                let e = &self.edges[k];
                e.left_face == face || e.right_face == face
            })
            .collect()
    }

    /// Isolated nodes owned by the face.
    pub fn isolated_nodes_in_face(&self, face: FaceKey) -> Vec<NodeKey> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.containing_face == Some(face))
            .map(|(k, _)| k)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_topology_has_only_universe() {
        let topo = Topology::new("city", 4326, 1e-9);
        assert_eq!(topo.node_count(), 0);
        assert_eq!(topo.edge_count(), 0);
        assert_eq!(topo.face_count(), 1);
        assert!(topo.face(topo.universe()).is_some());
        assert!(topo.face(topo.universe()).unwrap().mbr.is_none());
    }

    #[test]
    fn insert_node_indexes_and_notifies() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let mut topo = Topology::new("t", 0, 1e-9);
        let seen = Rc::new(RefCell::new(0));
        let seen2 = Rc::clone(&seen);
        topo.on(
            EventKind::AddNode,
            Box::new(move |_| *seen2.borrow_mut() += 1),
        );

        let n = topo.insert_node(NodeData {
            coord: Coord::new(1.0, 2.0),
            containing_face: Some(topo.universe()),
        });

        assert_eq!(*seen.borrow(), 1);
        assert_eq!(topo.find_node_at_point(Coord::new(1.0, 2.0)).unwrap(), Some(n));
        assert_eq!(topo.find_node_at_point(Coord::new(9.0, 9.0)).unwrap(), None);
    }

    #[test]
    fn node_degree_counts_closed_edges_twice() {
        let mut topo = Topology::new("t", 0, 1e-9);
        let universe = topo.universe();
        let a = topo.insert_node(NodeData {
            coord: Coord::new(0.0, 0.0),
            containing_face: Some(universe),
        });
        topo.insert_edge_with(|k| EdgeData {
            start: a,
            end: a,
            coords: vec![
                Coord::new(0.0, 0.0),
                Coord::new(1.0, 0.0),
                Coord::new(0.0, 1.0),
                Coord::new(0.0, 0.0),
            ],
            next_left: EdgeEnd::forward(k),
            next_right: EdgeEnd::backward(k),
            left_face: universe,
            right_face: universe,
        });
        assert_eq!(topo.node_degree(a), 2);
    }

    #[test]
    fn window_query_filters_by_curve_predicate() {
        let mut topo = Topology::new("t", 0, 1e-9);
        let universe = topo.universe();
        let a = topo.insert_node(NodeData {
            coord: Coord::new(0.0, 0.0),
            containing_face: Some(universe),
        });
        let b = topo.insert_node(NodeData {
            coord: Coord::new(2.0, 2.0),
            containing_face: Some(universe),
        });
        let straight = topo.insert_edge_with(|k| EdgeData {
            start: a,
            end: b,
            coords: vec![Coord::new(0.0, 0.0), Coord::new(2.0, 2.0)],
            next_left: EdgeEnd::backward(k),
            next_right: EdgeEnd::forward(k),
            left_face: universe,
            right_face: universe,
        });
        let bent = topo.insert_edge_with(|k| EdgeData {
            start: a,
            end: b,
            coords: vec![
                Coord::new(0.0, 0.0),
                Coord::new(2.0, 0.0),
                Coord::new(2.0, 2.0),
            ],
            next_left: EdgeEnd::backward(k),
            next_right: EdgeEnd::forward(k),
            left_face: universe,
            right_face: universe,
        });

        let window =
            Rect::of_coords(&[Coord::new(-1.0, -1.0), Coord::new(3.0, 3.0)]).unwrap();
        let mut all = topo.edges_in_window(window);
        all.sort();
        let mut expected = vec![straight, bent];
        expected.sort();
        assert_eq!(all, expected);

        let two_segment = topo.edges_in_window_where(window, |cs| cs.len() == 2);
        assert_eq!(two_segment, vec![straight]);
    }

    #[test]
    fn delete_edge_unlinks_adjacency() {
        let mut topo = Topology::new("t", 0, 1e-9);
        let universe = topo.universe();
        let a = topo.insert_node(NodeData {
            coord: Coord::new(0.0, 0.0),
            containing_face: Some(universe),
        });
        let b = topo.insert_node(NodeData {
            coord: Coord::new(1.0, 0.0),
            containing_face: Some(universe),
        });
        let e = topo.insert_edge_with(|k| EdgeData {
            start: a,
            end: b,
            coords: vec![Coord::new(0.0, 0.0), Coord::new(1.0, 0.0)],
            next_left: EdgeEnd::backward(k),
            next_right: EdgeEnd::forward(k),
            left_face: universe,
            right_face: universe,
        });
        assert_eq!(topo.node_degree(a), 1);
        topo.delete_edge(e).unwrap();
        assert_eq!(topo.node_degree(a), 0);
        assert!(topo.edges_in_window(Rect::point(Coord::new(0.5, 0.0))).is_empty());
    }
}
