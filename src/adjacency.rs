// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Azimuth-based discovery of the neighboring edge-ends around a node.
//!
//! Whenever an edge-end is attached to a node, the editor needs the edge-end
//! angularly nearest clockwise and counter-clockwise of the candidate
//! departure azimuth, plus the face each borders. This is a pure query; the
//! caller performs the actual pointer splicing.

use std::f64::consts::TAU;

use smallvec::SmallVec;

use crate::arena::Topology;
use crate::error::{Error, Result};
use crate::geom;
use crate::keys::{EdgeEnd, FaceKey, NodeKey};

/// Result of scanning the edge-ends incident on one node.
///
/// `next_cw` / `next_ccw` are `None` when the angularly nearest end is the
/// opposite end of the pending edge itself (closed-edge case) or when the
/// node has no incident edges at all; the caller distinguishes the two by
/// the returned count.
#[derive(Debug)]
pub(crate) struct AdjacencyScan {
    /// Azimuth of the candidate edge-end departing the node.
    pub az: f64,
    pub next_cw: Option<EdgeEnd>,
    pub cw_face: Option<FaceKey>,
    pub next_ccw: Option<EdgeEnd>,
    pub ccw_face: Option<FaceKey>,
    pub was_isolated: bool,
}

impl AdjacencyScan {
    pub fn new(az: f64) -> Self {
        Self {
            az,
            next_cw: None,
            cw_face: None,
            next_ccw: None,
            ccw_face: None,
            was_isolated: false,
        }
    }
}

/// Azimuth difference normalized into `(0, TAU]`.
fn az_clockwise_from(az: f64, reference: f64) -> f64 {
    let mut d = az - reference;
    while d <= 0.0 {
        d += TAU;
    }
    while d > TAU {
        d -= TAU;
    }
    d
}

impl Topology {
    /// Scans all edge-ends incident on `node` and fills `scan` with the
    /// angularly nearest ends clockwise and counter-clockwise of `scan.az`.
    ///
    /// `other_az` carries the departure azimuth of the opposite end of the
    /// pending edge when that edge is closed (both ends on this node); it
    /// competes in the angular ordering but is reported as `None`.
    ///
    /// Returns the number of existing edge-ends found. Angular ties between
    /// distinct ends mean coincident geometry survived the crossing checks
    /// and are reported as corruption.
    pub(crate) fn find_adjacent_edge_ends(
        &self,
        node: NodeKey,
        scan: &mut AdjacencyScan,
        other_az: Option<f64>,
    ) -> Result<usize> {
        // (clockwise distance, end, bordering face cw-side, ccw-side)
        type Candidate = (f64, Option<EdgeEnd>, Option<FaceKey>, Option<FaceKey>);
        let mut candidates: SmallVec<[Candidate; 8]> = SmallVec::new();

        let mut found = 0usize;
        for edge_key in self.incident_edges(node) {
            let edge = &self.edges[edge_key];
            if edge.start == node {
                let az = geom::azimuth(edge.coords[0], edge.coords[1]).ok_or_else(|| {
                    Error::CorruptedTopology(format!("degenerate first segment of {edge_key:?}"))
                })?;
                candidates.push((
                    az_clockwise_from(az, scan.az),
                    Some(EdgeEnd::forward(edge_key)),
                    Some(edge.left_face),
                    Some(edge.right_face),
                ));
                found += 1;
            }
            if edge.end == node {
                let n = edge.coords.len();
                let az = geom::azimuth(edge.coords[n - 1], edge.coords[n - 2]).ok_or_else(|| {
                    Error::CorruptedTopology(format!("degenerate last segment of {edge_key:?}"))
                })?;
                candidates.push((
                    az_clockwise_from(az, scan.az),
                    Some(EdgeEnd::backward(edge_key)),
                    Some(edge.right_face),
                    Some(edge.left_face),
                ));
                found += 1;
            }
        }

        if found == 0 {
            return Ok(0);
        }

        if let Some(az) = other_az {
            candidates.push((az_clockwise_from(az, scan.az), None, None, None));
        }

        candidates.sort_by(|a, b| a.0.total_cmp(&b.0));
        for pair in candidates.windows(2) {
            if (pair[1].0 - pair[0].0).abs() < 1e-12 {
                return Err(Error::CorruptedTopology(format!(
                    "coincident edge-end azimuths at node {node:?}"
                )));
            }
        }

        let nearest_cw = candidates.first().expect("nonempty");
        let nearest_ccw = candidates.last().expect("nonempty");
        scan.next_cw = nearest_cw.1;
        scan.cw_face = nearest_cw.2;
        scan.next_ccw = nearest_ccw.1;
        scan.ccw_face = nearest_ccw.3;

        Ok(found)
    }
}
