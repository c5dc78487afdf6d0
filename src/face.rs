// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Face boundary derivation and face splitting.
//!
//! Faces store no geometry: their boundaries are derived on demand by
//! walking the next-pointer rings of the edges that name them. The split
//! algorithm extracts the ring started by a new edge-end, decides its
//! winding, and rebinds the edges and isolated nodes that fall on the new
//! face's side of the shell.

use rustc_hash::FxHashSet;

use crate::arena::Topology;
use crate::error::{Error, Result};
use crate::geom::{self, Coord, Rect};
use crate::keys::{EdgeEnd, FaceKey};

/// Outcome of [`Topology::add_face_split`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceSplit {
    /// The edge-end does not close a proper ring; nothing was created.
    NoSplit,
    /// The target face is the universe and the ring winds clockwise: the
    /// universe must never be assigned a bounded interior.
    WrongWinding,
    /// A new face was materialized.
    Split(FaceKey),
}

impl Topology {
    /// Extracts the ring of directed edge-ends starting at `start`,
    /// following next-pointers until the walk returns to `start`.
    ///
    /// Fails with corruption if the walk does not close within `2 × edges`
    /// steps; every well-formed ring must.
    pub fn ring_edges(&self, start: EdgeEnd) -> Result<Vec<EdgeEnd>> {
        if !self.edges.contains_key(start.edge) {
            return Err(Error::EdgeNotFound(start.edge));
        }
        let limit = 2 * self.edges.len() + 2;
        let mut ring = vec![start];
        let mut current = start;
        loop {
            let next = self.edges[current.edge].next(current.forward);
            if next == start {
                return Ok(ring);
            }
            if ring.len() >= limit {
                return Err(Error::CorruptedTopology(format!(
                    "ring from {start:?} did not close within {limit} steps"
                )));
            }
            ring.push(next);
            current = next;
        }
    }

    /// Concatenates the coordinate sequences of a ring into a closed shell,
    /// reversing edges traversed backward and deduplicating joint points.
    pub(crate) fn ring_shell(&self, ring: &[EdgeEnd]) -> Vec<Coord> {
        let mut shell: Vec<Coord> = Vec::new();
        for end in ring {
            let coords = &self.edges[end.edge].coords;
            let skip = usize::from(!shell.is_empty());
            if end.forward {
                shell.extend(coords.iter().skip(skip).copied());
            } else {
                shell.extend(coords.iter().rev().skip(skip).copied());
            }
        }
        shell
    }

    /// The closed boundary rings of a face, derived by ring walks over the
    /// edges naming it. A bounded face yields one counter-clockwise shell
    /// plus a clockwise ring per hole; the universe yields one clockwise
    /// ring per island.
    pub fn face_geometry(&self, face: FaceKey) -> Result<Vec<Vec<Coord>>> {
        if !self.faces.contains_key(face) {
            return Err(Error::FaceNotFound(face));
        }
        let mut pending: FxHashSet<EdgeEnd> = FxHashSet::default();
        for edge_key in self.edges_bound_by_face(face) {
            let edge = &self.edges[edge_key];
            if edge.left_face == face {
                pending.insert(EdgeEnd::forward(edge_key));
            }
            if edge.right_face == face {
                pending.insert(EdgeEnd::backward(edge_key));
            }
        }

        let mut rings = Vec::new();
        while let Some(&start) = pending.iter().next() {
            let ring = self.ring_edges(start)?;
            for end in &ring {
                pending.remove(end);
            }
            rings.push(self.ring_shell(&ring));
        }
        Ok(rings)
    }

    /// True if the point lies in the face's interior.
    ///
    /// A point is inside a face when some counter-clockwise boundary ring
    /// contains it (or the face has none, as the universe does) and no
    /// clockwise ring does.
    pub fn face_contains_point(&self, face: FaceKey, p: Coord) -> Result<bool> {
        let rings = self.face_geometry(face)?;
        let mut has_shell = false;
        let mut in_shell = false;
        for ring in &rings {
            let inside = geom::point_in_ring(p, ring);
            if geom::signed_area(ring) > 0.0 {
                has_shell = true;
                in_shell = in_shell || inside;
            } else if inside {
                return Ok(false);
            }
        }
        Ok(!has_shell || in_shell)
    }

    /// The face whose interior contains the point; defaults to the universe.
    pub fn find_face_containing_point(&self, p: Coord) -> Result<FaceKey> {
        for face in self.faces_in_window(Rect::point(p)) {
            if face == self.universe() {
                continue;
            }
            if self.face_contains_point(face, p)? {
                return Ok(face);
            }
        }
        Ok(self.universe())
    }

    /// Re-derives a face's MBR by polygonizing its bounding edges and
    /// refreshes the spatial index. No-op for the universe and for faces
    /// with no bounding edges.
    pub(crate) fn update_face_mbr(&mut self, face: FaceKey) {
        if face == self.universe() {
            return;
        }
        let lines: Vec<Vec<Coord>> = self
            .edges_bound_by_face(face)
            .into_iter()
            .map(|k| self.edges[k].coords.clone())
            .collect();
        let rings = geom::polygonize(&lines);
        let mut mbr: Option<Rect> = None;
        for ring in &rings {
            if let Some(r) = Rect::of_coords(ring) {
                mbr = Some(match mbr {
                    Some(acc) => acc.union(r),
                    None => r,
                });
            }
        }
        if let Some(rect) = mbr {
            self.face_modified(face, Some(rect));
        }
    }

    /// Detects and materializes the face split caused by traversing a newly
    /// inserted edge from `start`, inside `face`.
    ///
    /// With `mbr_only` the ring is still walked and the winding still
    /// decides the outcome, but instead of allocating a face the existing
    /// one keeps its identity and only has its MBR refreshed; the
    /// "ModFace" policy for the side that keeps the original face.
    pub(crate) fn add_face_split(
        &mut self,
        start: EdgeEnd,
        face: FaceKey,
        mbr_only: bool,
    ) -> Result<FaceSplit> {
        let ring = self.ring_edges(start)?;

        // Reaching the opposite side of the starting edge means the walk
        // wrapped around a dangling configuration instead of closing a
        // proper face boundary.
        if ring.contains(&start.reversed()) {
            return Ok(FaceSplit::NoSplit);
        }

        let shell = self.ring_shell(&ring);
        let is_ccw = geom::signed_area(&shell) > 0.0;
        let universe = self.universe();

        if face == universe && !is_ccw {
            return Ok(FaceSplit::WrongWinding);
        }

        let shell_box = Rect::of_coords(&shell).expect("ring shell is never empty");
        tracing::debug!(
            ?start,
            ccw = is_ccw,
            ring_len = ring.len(),
            "face split ring extracted"
        );

        if mbr_only {
            if face != universe && is_ccw {
                self.face_modified(face, Some(shell_box));
            }
            return Ok(FaceSplit::NoSplit);
        }

        // A counter-clockwise shell bounds the new face; a clockwise shell
        // means the new face is everything of the old face outside it.
        let new_mbr = if is_ccw {
            shell_box
        } else {
            self.faces[face].mbr.unwrap_or(shell_box)
        };
        let new_face = self.insert_face(Some(new_mbr));

        let mut forward_in_ring: FxHashSet<_> = FxHashSet::default();
        let mut backward_in_ring: FxHashSet<_> = FxHashSet::default();
        for end in &ring {
            if end.forward {
                forward_in_ring.insert(end.edge);
            } else {
                backward_in_ring.insert(end.edge);
            }
        }

        for edge_key in self.edges_bound_by_face(face) {
            let in_fwd = forward_in_ring.contains(&edge_key);
            let in_bwd = backward_in_ring.contains(&edge_key);
            if in_fwd || in_bwd {
                // Ring members take the new face on the traversed side.
                let edge = &mut self.edges[edge_key];
                if in_fwd {
                    edge.left_face = new_face;
                }
                if in_bwd {
                    edge.right_face = new_face;
                }
            } else {
                // Off-ring edges move iff an interior point falls on the
                // new face's side of the shell.
                let ep = {
                    let coords = &self.edges[edge_key].coords;
                    Coord::new(
                        (coords[0].x + coords[1].x) / 2.0,
                        (coords[0].y + coords[1].y) / 2.0,
                    )
                };
                if geom::point_in_ring(ep, &shell) != is_ccw {
                    continue;
                }
                let edge = &mut self.edges[edge_key];
                if edge.left_face == face {
                    edge.left_face = new_face;
                }
                if edge.right_face == face {
                    edge.right_face = new_face;
                }
            }
        }

        for node_key in self.isolated_nodes_in_face(face) {
            let coord = self.nodes[node_key].coord;
            if geom::point_in_ring(coord, &shell) != is_ccw {
                continue;
            }
            self.nodes[node_key].containing_face = Some(new_face);
        }

        Ok(FaceSplit::Split(new_face))
    }
}
