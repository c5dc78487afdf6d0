// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The edge editor: the public mutation surface of a topology.
//!
//! Every operation validates its input against the planar invariants before
//! touching the arena: coincident nodes, crossing or coincident curves and
//! face disagreements are rejected with typed errors. Edge insertion splices
//! the new edge-ends into the azimuth-ordered rings around each endpoint
//! and then runs face-split detection; edge removal bypasses the removed
//! ends in those rings and floods the merged region with a single face.

use rustc_hash::FxHashSet;

use crate::adjacency::AdjacencyScan;
use crate::arena::{EdgeData, NodeData, Topology};
use crate::error::{Error, Result};
use crate::face::FaceSplit;
use crate::geom::{self, Coord, Rect};
use crate::keys::{EdgeEnd, EdgeKey, FaceKey, NodeKey};

/// A ring pointer of an edge being inserted, before its key exists.
#[derive(Debug, Clone, Copy)]
enum Pending {
    /// The new edge's own end, in the given direction.
    Own(bool),
    /// An existing edge-end.
    Other(EdgeEnd),
}

impl Pending {
    fn resolve(self, key: EdgeKey) -> EdgeEnd {
        match self {
            Pending::Own(forward) => EdgeEnd { edge: key, forward },
            Pending::Other(end) => end,
        }
    }
}

impl Topology {
    // --- Isolated entities ---

    /// Adds an isolated node inside whatever face contains the point.
    ///
    /// Fails with [`Error::CoincidentNode`] if a node already occupies the
    /// location (within tolerance).
    pub fn add_iso_node(&mut self, coord: Coord) -> Result<NodeKey> {
        if let Some(existing) = self.find_node_at_point(coord)? {
            return Err(Error::CoincidentNode(existing));
        }
        let window = Rect::point(coord).expanded(self.tolerance);
        for key in self.edges_in_window(window) {
            if geom::distance(coord, &self.edges[key].coords) <= self.tolerance {
                return Err(Error::CrossesEdge(key));
            }
        }
        let face = self.find_face_containing_point(coord)?;
        tracing::debug!(x = coord.x, y = coord.y, ?face, "adding isolated node");
        Ok(self.insert_node(NodeData {
            coord,
            containing_face: Some(face),
        }))
    }

    /// Removes an isolated node. A node with incident edges is rejected
    /// with [`Error::NotIsolated`].
    pub fn remove_iso_node(&mut self, node: NodeKey) -> Result<()> {
        let data = self.node(node).ok_or(Error::NodeNotFound(node))?;
        if data.containing_face.is_none() {
            return Err(Error::NotIsolated(node));
        }
        tracing::debug!(?node, "removing isolated node");
        self.delete_node(node)
    }

    /// Adds an edge between two isolated nodes lying in the same face.
    ///
    /// The new edge dangles: it bounds no ring other than its own bounce
    /// ring, and both faces are the nodes' shared containing face. The
    /// endpoints stop being isolated.
    pub fn add_iso_edge(
        &mut self,
        start: NodeKey,
        end: NodeKey,
        coords: Vec<Coord>,
    ) -> Result<EdgeKey> {
        if start == end {
            return Err(Error::GeometryInvalid(
                "start and end node must differ".into(),
            ));
        }
        let start_face = self
            .node(start)
            .ok_or(Error::NodeNotFound(start))?
            .containing_face
            .ok_or(Error::NotIsolated(start))?;
        let end_face = self
            .node(end)
            .ok_or(Error::NodeNotFound(end))?
            .containing_face
            .ok_or(Error::NotIsolated(end))?;
        if start_face != end_face {
            return Err(Error::FacesMismatch);
        }
        self.validate_edge_geometry(start, end, &coords)?;
        self.check_edge_crossing(start, end, &coords)?;

        tracing::debug!(?start, ?end, ?start_face, "adding isolated edge");
        let key = self.insert_edge_with(|k| EdgeData {
            start,
            end,
            coords,
            next_left: EdgeEnd::backward(k),
            next_right: EdgeEnd::forward(k),
            left_face: start_face,
            right_face: start_face,
        });
        self.nodes[start].containing_face = None;
        self.nodes[end].containing_face = None;
        Ok(key)
    }

    // --- Edge insertion ---

    /// Adds an edge between two existing nodes; any face split allocates a
    /// fresh face on *each* side and deletes the face that was split.
    pub fn add_edge_new_faces(
        &mut self,
        start: NodeKey,
        end: NodeKey,
        coords: Vec<Coord>,
    ) -> Result<EdgeKey> {
        self.add_edge(start, end, coords, false)
    }

    /// Adds an edge between two existing nodes; on a face split the face
    /// left of the new edge is the fresh one and the old face keeps its
    /// identity on the right.
    pub fn add_edge_mod_face(
        &mut self,
        start: NodeKey,
        end: NodeKey,
        coords: Vec<Coord>,
    ) -> Result<EdgeKey> {
        self.add_edge(start, end, coords, true)
    }

    fn add_edge(
        &mut self,
        start: NodeKey,
        end: NodeKey,
        coords: Vec<Coord>,
        mod_face: bool,
    ) -> Result<EdgeKey> {
        self.validate_edge_geometry(start, end, &coords)?;
        self.check_edge_crossing(start, end, &coords)?;

        let is_closed = start == end;
        let n = coords.len();
        let start_az = geom::azimuth(coords[0], coords[1])
            .ok_or_else(|| Error::GeometryInvalid("degenerate first segment".into()))?;
        let end_az = geom::azimuth(coords[n - 1], coords[n - 2])
            .ok_or_else(|| Error::GeometryInvalid("degenerate last segment".into()))?;
        tracing::debug!(?start, ?end, closed = is_closed, mod_face, "adding edge");

        // Isolated endpoints seed the side faces with their containing face.
        let mut left_face: Option<FaceKey> = None;
        let mut right_face: Option<FaceKey> = None;
        for node in [start, end] {
            if let Some(f) = self.nodes[node].containing_face {
                match left_face {
                    None => {
                        left_face = Some(f);
                        right_face = Some(f);
                    }
                    Some(seed) if seed != f => return Err(Error::FacesMismatch),
                    Some(_) => {}
                }
            }
        }

        // Splice point at the start node: the ends angularly nearest the
        // departing curve decide the ring pointers and the side faces.
        let mut span = AdjacencyScan::new(start_az);
        let found_start =
            self.find_adjacent_edge_ends(start, &mut span, is_closed.then_some(end_az))?;
        span.was_isolated = found_start == 0;
        let (next_right, prev_left) = if span.was_isolated {
            (Pending::Own(!is_closed), Pending::Own(is_closed))
        } else {
            if let Some(f) = span.cw_face {
                match right_face {
                    None => right_face = Some(f),
                    Some(seen) if seen != f => return Err(Error::SideLocationConflict),
                    Some(_) => {}
                }
            }
            if let Some(f) = span.ccw_face {
                match left_face {
                    None => left_face = Some(f),
                    Some(seen) if seen != f => return Err(Error::SideLocationConflict),
                    Some(_) => {}
                }
            }
            (
                span.next_cw.map(Pending::Other).unwrap_or(Pending::Own(false)),
                span.next_ccw
                    .map(|e| Pending::Other(e.reversed()))
                    .unwrap_or(Pending::Own(true)),
            )
        };

        // Same at the end node; faces found here must agree with whatever
        // the start side already committed to.
        let mut epan = AdjacencyScan::new(end_az);
        let found_end =
            self.find_adjacent_edge_ends(end, &mut epan, is_closed.then_some(start_az))?;
        epan.was_isolated = found_end == 0;
        let (next_left, prev_right) = if epan.was_isolated {
            (Pending::Own(is_closed), Pending::Own(!is_closed))
        } else {
            if let Some(f) = epan.cw_face {
                match right_face {
                    None => right_face = Some(f),
                    Some(seen) if seen != f => return Err(Error::SideLocationConflict),
                    Some(_) => {}
                }
            }
            if let Some(f) = epan.ccw_face {
                match left_face {
                    None => left_face = Some(f),
                    Some(seen) if seen != f => return Err(Error::SideLocationConflict),
                    Some(_) => {}
                }
            }
            (
                epan.next_cw.map(Pending::Other).unwrap_or(Pending::Own(true)),
                epan.next_ccw
                    .map(|e| Pending::Other(e.reversed()))
                    .unwrap_or(Pending::Own(false)),
            )
        };

        let (left_face, right_face) = match (left_face, right_face) {
            (Some(l), Some(r)) if l == r => (l, r),
            (Some(_), Some(_)) => {
                return Err(Error::CorruptedTopology(
                    "edge sides resolve to different faces".into(),
                ))
            }
            _ => {
                return Err(Error::CorruptedTopology(
                    "could not derive the face containing the new edge".into(),
                ))
            }
        };

        let key = self.insert_edge_with(|k| EdgeData {
            start,
            end,
            coords,
            next_left: next_left.resolve(k),
            next_right: next_right.resolve(k),
            left_face,
            right_face,
        });

        // Splice the predecessors' ring pointers onto the new ends.
        if let Pending::Other(p) = prev_left {
            self.edges[p.edge].set_next(p.forward, EdgeEnd::forward(key));
        }
        if let Pending::Other(p) = prev_right {
            self.edges[p.edge].set_next(p.forward, EdgeEnd::backward(key));
        }

        if span.was_isolated {
            self.nodes[start].containing_face = None;
        }
        if epan.was_isolated {
            self.nodes[end].containing_face = None;
        }

        // Face phase: walk both rings of the new edge and materialize the
        // split, if any.
        let old_face = left_face;
        let universe = self.universe();
        if mod_face {
            match self.add_face_split(EdgeEnd::forward(key), old_face, false)? {
                FaceSplit::NoSplit => {}
                FaceSplit::WrongWinding => {
                    // The bounded ring lies on the other side of the edge.
                    self.add_face_split(EdgeEnd::backward(key), old_face, false)?;
                }
                FaceSplit::Split(_) => {
                    // The old face survives on the right; refresh its MBR.
                    self.add_face_split(EdgeEnd::backward(key), old_face, true)?;
                }
            }
        } else {
            let first = self.add_face_split(EdgeEnd::backward(key), old_face, false)?;
            if first != FaceSplit::NoSplit {
                let second = self.add_face_split(EdgeEnd::forward(key), old_face, false)?;
                let created = matches!(first, FaceSplit::Split(_))
                    || matches!(second, FaceSplit::Split(_));
                if created && old_face != universe {
                    self.delete_face(old_face)?;
                }
            }
        }
        Ok(key)
    }

    // --- Edge removal ---

    /// Removes an edge; if two faces merge, a fresh face replaces both.
    /// Returns the face now covering the space the edge bounded.
    pub fn rem_edge_new_face(&mut self, edge: EdgeKey) -> Result<FaceKey> {
        self.rem_edge(edge, false)
    }

    /// Removes an edge; if two faces merge, the right face absorbs the
    /// left one (the universe always wins over a bounded face).
    pub fn rem_edge_mod_face(&mut self, edge: EdgeKey) -> Result<FaceKey> {
        self.rem_edge(edge, true)
    }

    fn rem_edge(&mut self, edge: EdgeKey, mod_face: bool) -> Result<FaceKey> {
        let data = self.edges.get(edge).cloned().ok_or(Error::EdgeNotFound(edge))?;
        tracing::debug!(?edge, mod_face, "removing edge");
        let universe = self.universe();
        let fwd = EdgeEnd::forward(edge);
        let bwd = EdgeEnd::backward(edge);

        // At each endpoint, references to a removed end are redirected to
        // the end's clockwise successor around that node, which is what
        // the removed edge's own opposite-side pointer stores. Chase
        // through self-references (dangling and closed configurations).
        let chase = |mut t: EdgeEnd| {
            for _ in 0..2 {
                if t.edge != edge {
                    break;
                }
                t = if t.forward { data.next_right } else { data.next_left };
            }
            t
        };
        let repl_fwd = chase(data.next_right);
        let repl_bwd = chase(data.next_left);

        let mut affected: FxHashSet<EdgeKey> = FxHashSet::default();
        for node in [data.start, data.end] {
            affected.extend(self.incident_edges(node));
        }
        affected.remove(&edge);
        for cand in affected {
            let c = &mut self.edges[cand];
            if c.next_left == fwd {
                c.next_left = repl_fwd;
            } else if c.next_left == bwd {
                c.next_left = repl_bwd;
            }
            if c.next_right == fwd {
                c.next_right = repl_fwd;
            } else if c.next_right == bwd {
                c.next_right = repl_bwd;
            }
        }

        // The face flooding the merged region: the shared face when the
        // sides agree, the universe when it is one of them, and otherwise
        // the kept or freshly created face per removal policy.
        let (flood, absorbed) = if data.left_face == data.right_face {
            (data.left_face, Vec::new())
        } else {
            let flood = if data.left_face == universe || data.right_face == universe {
                universe
            } else if mod_face {
                data.right_face
            } else {
                let mbr = match (
                    self.faces[data.left_face].mbr,
                    self.faces[data.right_face].mbr,
                ) {
                    (Some(a), Some(b)) => Some(a.union(b)),
                    (a, b) => a.or(b),
                };
                self.insert_face(mbr)
            };
            let absorbed: Vec<FaceKey> = [data.left_face, data.right_face]
                .into_iter()
                .filter(|&f| f != flood)
                .collect();
            (flood, absorbed)
        };

        for &old in &absorbed {
            for k in self.edges_bound_by_face(old) {
                if k == edge {
                    continue;
                }
                let e = &mut self.edges[k];
                if e.left_face == old {
                    e.left_face = flood;
                }
                if e.right_face == old {
                    e.right_face = flood;
                }
            }
            for node in self.isolated_nodes_in_face(old) {
                self.nodes[node].containing_face = Some(flood);
            }
        }

        self.delete_edge(edge)?;
        for old in absorbed {
            self.delete_face(old)?;
        }

        // Endpoints left without edges become isolated in the flood face.
        for node in [data.start, data.end] {
            if self.node_degree(node) == 0 {
                self.nodes[node].containing_face = Some(flood);
            }
        }
        if flood != universe {
            self.update_face_mbr(flood);
        }
        Ok(flood)
    }

    // --- Edge reshaping ---

    /// Splits an edge at an interior point, inserting a node there.
    ///
    /// The edge keeps its key and the head part of the curve; a new edge
    /// carries the tail. Ring pointers of both halves and of third-party
    /// edges arriving at the old end node are rewired. Returns the new
    /// node's key.
    pub fn mod_edge_split(&mut self, edge: EdgeKey, coord: Coord) -> Result<NodeKey> {
        let old = self.edges.get(edge).cloned().ok_or(Error::EdgeNotFound(edge))?;
        if let Some(existing) = self.find_node_at_point(coord)? {
            return Err(Error::CoincidentNode(existing));
        }
        let (head, tail) = geom::split(&old.coords, coord, self.tolerance)
            .ok_or_else(|| Error::GeometryInvalid("split point not on edge interior".into()))?;
        tracing::debug!(?edge, x = coord.x, y = coord.y, "splitting edge");

        // An interior-vertex hit snaps the node to the stored vertex.
        let node = self.insert_node(NodeData {
            coord: tail[0],
            containing_face: None,
        });
        let new_edge = self.insert_edge_with(|k| EdgeData {
            start: node,
            end: old.end,
            coords: tail,
            next_left: if old.next_left == EdgeEnd::backward(edge) {
                EdgeEnd::backward(k)
            } else {
                old.next_left
            },
            next_right: EdgeEnd::backward(edge),
            left_face: old.left_face,
            right_face: old.right_face,
        });

        // Ends arriving at the old end node now continue onto the tail.
        for cand in self.incident_edges(old.end) {
            if cand == edge || cand == new_edge {
                continue;
            }
            let c = &mut self.edges[cand];
            if c.next_left == EdgeEnd::backward(edge) {
                c.next_left = EdgeEnd::backward(new_edge);
            }
            if c.next_right == EdgeEnd::backward(edge) {
                c.next_right = EdgeEnd::backward(new_edge);
            }
        }
        {
            let e = &mut self.edges[edge];
            // A closed edge references its own backward end at the start
            // node; that end now belongs to the tail.
            if e.next_right == EdgeEnd::backward(edge) {
                e.next_right = EdgeEnd::backward(new_edge);
            }
            e.coords = head;
            e.end = node;
            e.next_left = EdgeEnd::forward(new_edge);
        }

        if old.start != old.end {
            if let Some(set) = self.node_to_edges.get_mut(&old.end) {
                set.remove(&edge);
            }
        }
        self.node_to_edges.entry(node).or_default().insert(edge);
        self.edge_modified(edge);
        Ok(node)
    }

    /// Heals two edges joined by a node of degree exactly two, the inverse
    /// of [`Topology::mod_edge_split`].
    ///
    /// `e1` survives with the concatenated curve (reversing `e2` when the
    /// shared node joins like-ends); `e2` and the shared node are removed.
    /// Returns the removed node's key.
    pub fn mod_edge_heal(&mut self, e1: EdgeKey, e2: EdgeKey) -> Result<NodeKey> {
        if e1 == e2 {
            return Err(Error::HealNotAdjacent(e1, e2));
        }
        let d1 = self.edges.get(e1).cloned().ok_or(Error::EdgeNotFound(e1))?;
        let d2 = self.edges.get(e2).cloned().ok_or(Error::EdgeNotFound(e2))?;

        // Edges sharing both endpoints form a closed loop; fusing them
        // would collapse the ring around the enclosed face.
        let shares_start = d1.start == d2.start || d1.start == d2.end;
        let shares_end = d1.end == d2.start || d1.end == d2.end;
        if shares_start && shares_end {
            return Err(Error::HealNotAdjacent(e1, e2));
        }

        // The joint must carry exactly the two edge-ends being fused.
        let shared = [d1.start, d1.end]
            .into_iter()
            .find(|&n| (n == d2.start || n == d2.end) && self.node_degree(n) == 2)
            .ok_or(Error::HealNotAdjacent(e1, e2))?;
        tracing::debug!(?e1, ?e2, node = ?shared, "healing edges");

        let at_e1_end = d1.end == shared;
        // True when e2's own orientation agrees with the merged flow.
        let e2_forward = if at_e1_end {
            d2.start == shared
        } else {
            d2.end == shared
        };

        let (l2, r2) = if e2_forward {
            (d2.left_face, d2.right_face)
        } else {
            (d2.right_face, d2.left_face)
        };
        if (l2, r2) != (d1.left_face, d1.right_face) {
            return Err(Error::CorruptedTopology(format!(
                "sides of {e1:?} and {e2:?} disagree across their shared node"
            )));
        }

        let (coords, new_start, new_end) = if at_e1_end {
            let mut coords = d1.coords.clone();
            if e2_forward {
                coords.extend_from_slice(&d2.coords[1..]);
                (coords, d1.start, d2.end)
            } else {
                coords.extend(d2.coords[..d2.coords.len() - 1].iter().rev().copied());
                (coords, d1.start, d2.start)
            }
        } else if e2_forward {
            let mut coords = d2.coords.clone();
            coords.extend_from_slice(&d1.coords[1..]);
            (coords, d2.start, d1.end)
        } else {
            let mut coords: Vec<Coord> = d2.coords.iter().rev().copied().collect();
            coords.extend_from_slice(&d1.coords[1..]);
            (coords, d2.end, d1.end)
        };

        let map_end = |end: EdgeEnd| -> EdgeEnd {
            if end.edge != e2 {
                return end;
            }
            EdgeEnd {
                edge: e1,
                forward: end.forward == e2_forward,
            }
        };

        // Ring pointers at the merged curve's outer ends, taken from
        // whichever edge owned that end before the heal.
        let next_left = map_end(if at_e1_end {
            if e2_forward {
                d2.next_left
            } else {
                d2.next_right
            }
        } else {
            d1.next_left
        });
        let next_right = map_end(if at_e1_end {
            d1.next_right
        } else if e2_forward {
            d2.next_right
        } else {
            d2.next_left
        });

        {
            let e = &mut self.edges[e1];
            e.start = new_start;
            e.end = new_end;
            e.coords = coords;
            e.next_left = next_left;
            e.next_right = next_right;
        }
        let far = if d2.start == shared { d2.end } else { d2.start };
        self.node_to_edges.entry(far).or_default().insert(e1);

        // References to the absorbed edge now name the survivor.
        let mut affected: FxHashSet<EdgeKey> = FxHashSet::default();
        for node in [d2.start, d2.end] {
            affected.extend(self.incident_edges(node));
        }
        affected.remove(&e1);
        affected.remove(&e2);
        for cand in affected {
            let c = &mut self.edges[cand];
            c.next_left = map_end(c.next_left);
            c.next_right = map_end(c.next_right);
        }

        self.edge_modified(e1);
        self.delete_edge(e2)?;
        self.delete_node(shared)?;
        Ok(shared)
    }

    // --- Validation helpers ---

    /// Endpoint and simplicity checks for a new edge curve.
    fn validate_edge_geometry(
        &self,
        start: NodeKey,
        end: NodeKey,
        coords: &[Coord],
    ) -> Result<()> {
        if coords.len() < 2 {
            return Err(Error::GeometryInvalid(
                "curve needs at least two points".into(),
            ));
        }
        let s = self.node(start).ok_or(Error::NodeNotFound(start))?.coord;
        let e = self.node(end).ok_or(Error::NodeNotFound(end))?.coord;
        if coords[0] != s {
            return Err(Error::GeometryInvalid(
                "curve must start at the start node".into(),
            ));
        }
        if coords[coords.len() - 1] != e {
            return Err(Error::GeometryInvalid(
                "curve must end at the end node".into(),
            ));
        }
        if !geom::is_simple(coords) {
            return Err(Error::GeometryInvalid("curve not simple".into()));
        }
        Ok(())
    }

    /// Rejects a new edge curve that passes through a foreign node or that
    /// coincides with, crosses or improperly intersects any existing edge
    /// near its bounding box.
    fn check_edge_crossing(&self, start: NodeKey, end: NodeKey, coords: &[Coord]) -> Result<()> {
        let window = Rect::of_coords(coords)
            .ok_or_else(|| Error::GeometryInvalid("empty curve".into()))?
            .expanded(self.tolerance);
        for key in self.nodes_in_window(window) {
            if key == start || key == end {
                continue;
            }
            if geom::distance(self.nodes[key].coord, coords) <= self.tolerance {
                return Err(Error::CrossesNode(key));
            }
        }
        for key in self.edges_in_window(window) {
            let other = &self.edges[key];
            let im = geom::relate(coords, &other.coords);
            let shares_node = other.start == start
                || other.start == end
                || other.end == start
                || other.end == end;
            if shares_node {
                if im.matches("1FFF*FFF2") {
                    return Err(Error::CoincidentEdge(key));
                }
                if im.matches("1********") {
                    return Err(Error::IntersectsEdge(key));
                }
                if im.matches("T********") {
                    return Err(Error::CrossesEdge(key));
                }
            } else if im.matches("T********") {
                return Err(Error::CrossesEdge(key));
            }
            // Interiors and boundaries may only meet at shared endpoints.
            if !im.matches("FF*F*****") {
                return Err(Error::IntersectsEdge(key));
            }
        }
        Ok(())
    }
}
