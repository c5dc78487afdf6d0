// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Planar Topology
//!
//! An editing engine for planar topologies: a partition of the plane into
//! nodes, edges and faces that share boundaries, after the SQL/MM topology
//! model.
//!
//! Entities live in an arena ([`Topology`]) as slot maps with stable
//! generational keys. Edges carry the only stored geometry; faces derive
//! their boundaries on demand from the circular rings of directed edge-ends
//! linked through next-pointers. A distinguished unbounded *universe* face
//! always exists and is never deleted.
//!
//! All mutation goes through the edit operations ([`Topology::add_iso_node`],
//! [`Topology::add_edge_new_faces`], [`Topology::rem_edge_mod_face`] and
//! friends), which validate planarity up front: coincident nodes, crossing
//! or coincident curves and face disagreements are rejected with typed
//! [`Error`]s before anything is mutated. Closing a ring splits a face;
//! removing a shared boundary merges two.
//!
//! ```
//! use planar_topology::{Coord, Topology};
//!
//! let mut topo = Topology::new("demo", 4326, 1e-9);
//! let a = topo.add_iso_node(Coord::new(0.0, 0.0)).unwrap();
//! let b = topo.add_iso_node(Coord::new(1.0, 0.0)).unwrap();
//! let c = topo.add_iso_node(Coord::new(0.0, 1.0)).unwrap();
//! topo.add_edge_new_faces(a, b, vec![Coord::new(0.0, 0.0), Coord::new(1.0, 0.0)]).unwrap();
//! topo.add_edge_new_faces(b, c, vec![Coord::new(1.0, 0.0), Coord::new(0.0, 1.0)]).unwrap();
//! topo.add_edge_new_faces(c, a, vec![Coord::new(0.0, 1.0), Coord::new(0.0, 0.0)]).unwrap();
//! // Closing the triangle split the universe: one bounded face appeared.
//! assert_eq!(topo.face_count(), 2);
//! ```

pub mod adjacency;
pub mod arena;
pub mod edit;
pub mod error;
pub mod events;
pub mod face;
pub mod geom;
pub mod keys;
pub mod spatial;

pub use arena::{EdgeData, FaceData, NodeData, Topology};
pub use error::{Error, Result};
pub use events::{Event, EventKind, ObserverId};
pub use face::FaceSplit;
pub use geom::{Coord, Rect};
pub use keys::{EdgeEnd, EdgeKey, FaceKey, NodeKey};
pub use spatial::RectIndex;
