// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for topology operations.
//!
//! All failures are synchronous, typed values. Validation errors report a
//! problem with the caller's input; [`Error::CorruptedTopology`] reports
//! pre-existing structural damage and must be treated as fatal rather than
//! retried.

use crate::keys::{EdgeKey, FaceKey, NodeKey};

/// Result type alias for topology operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during topology operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A node already exists at the requested location.
    #[error("coincident node {0:?}")]
    CoincidentNode(NodeKey),

    /// The operation requires an isolated node but found incident edges.
    #[error("not isolated node {0:?}")]
    NotIsolated(NodeKey),

    /// Two nodes expected to share a containing face do not.
    #[error("nodes in different faces")]
    FacesMismatch,

    /// Curve not simple, endpoint mismatch, or degenerate geometry.
    #[error("invalid geometry: {0}")]
    GeometryInvalid(String),

    /// The new curve coincides with an existing edge.
    #[error("coincident edge {0:?}")]
    CoincidentEdge(EdgeKey),

    /// The new curve properly crosses an existing edge.
    #[error("geometry crosses edge {0:?}")]
    CrossesEdge(EdgeKey),

    /// The new curve passes through a node that is not one of its endpoints.
    #[error("geometry crosses node {0:?}")]
    CrossesNode(NodeKey),

    /// The new curve intersects an existing edge outside shared endpoints.
    #[error("geometry intersects edge {0:?}")]
    IntersectsEdge(EdgeKey),

    /// The two endpoints of a new edge imply contradictory face assignment.
    #[error("side location conflict")]
    SideLocationConflict,

    /// Edge healing requires a shared node of degree exactly 2.
    #[error("edges {0:?} and {1:?} cannot be healed")]
    HealNotAdjacent(EdgeKey, EdgeKey),

    /// Node key not found in the arena.
    #[error("node not found: {0:?}")]
    NodeNotFound(NodeKey),

    /// Edge key not found in the arena.
    #[error("edge not found: {0:?}")]
    EdgeNotFound(EdgeKey),

    /// Face key not found in the arena.
    #[error("face not found: {0:?}")]
    FaceNotFound(FaceKey),

    /// Structural invariant violation found in existing data. Fatal.
    #[error("corrupted topology: {0}")]
    CorruptedTopology(String),
}
