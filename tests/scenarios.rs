// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end editing scenarios over the public API.

use std::cell::RefCell;
use std::rc::Rc;

use approx::assert_relative_eq;
use planar_topology::{geom, Coord, EdgeKey, Error, EventKind, NodeKey, Topology};

fn c(x: f64, y: f64) -> Coord {
    Coord::new(x, y)
}

fn topo() -> Topology {
    Topology::new("scenario", 4326, 1e-9)
}

struct Square {
    topo: Topology,
    nodes: [NodeKey; 4],
    edges: [EdgeKey; 4],
}

/// Unit square (0,0)-(1,0)-(1,1)-(0,1), counter-clockwise, one bounded face.
fn square() -> Square {
    let mut t = topo();
    let pts = [c(0.0, 0.0), c(1.0, 0.0), c(1.0, 1.0), c(0.0, 1.0)];
    let nodes: Vec<NodeKey> = pts.iter().map(|&p| t.add_iso_node(p).unwrap()).collect();
    let mut edges = Vec::new();
    for i in 0..4 {
        let j = (i + 1) % 4;
        edges.push(
            t.add_edge_new_faces(nodes[i], nodes[j], vec![pts[i], pts[j]])
                .unwrap(),
        );
    }
    Square {
        topo: t,
        nodes: nodes.try_into().unwrap(),
        edges: edges.try_into().unwrap(),
    }
}

#[test]
fn triangle_closure_creates_one_bounded_face() {
    let mut t = topo();
    let a = t.add_iso_node(c(0.0, 0.0)).unwrap();
    let b = t.add_iso_node(c(4.0, 0.0)).unwrap();
    let apex = t.add_iso_node(c(0.0, 3.0)).unwrap();

    t.add_edge_new_faces(a, b, vec![c(0.0, 0.0), c(4.0, 0.0)]).unwrap();
    assert_eq!(t.face_count(), 1); // a dangling edge splits nothing
    t.add_edge_new_faces(b, apex, vec![c(4.0, 0.0), c(0.0, 3.0)]).unwrap();
    assert_eq!(t.face_count(), 1);
    t.add_edge_new_faces(apex, a, vec![c(0.0, 3.0), c(0.0, 0.0)]).unwrap();
    assert_eq!(t.face_count(), 2);

    let face = t.face_keys().find(|&f| f != t.universe()).unwrap();
    let rings = t.face_geometry(face).unwrap();
    assert_eq!(rings.len(), 1);
    assert_relative_eq!(geom::signed_area(&rings[0]), 6.0, epsilon = 1e-12);

    assert_eq!(t.find_face_containing_point(c(1.0, 1.0)).unwrap(), face);
    assert_eq!(t.find_face_containing_point(c(3.9, 2.9)).unwrap(), t.universe());
}

#[test]
fn iso_node_lands_in_bounded_face() {
    let mut sq = square();
    let face = sq
        .topo
        .face_keys()
        .find(|&f| f != sq.topo.universe())
        .unwrap();
    let inner = sq.topo.add_iso_node(c(0.5, 0.5)).unwrap();
    assert_eq!(sq.topo.node(inner).unwrap().containing_face, Some(face));
    let outer = sq.topo.add_iso_node(c(3.0, 3.0)).unwrap();
    assert_eq!(
        sq.topo.node(outer).unwrap().containing_face,
        Some(sq.topo.universe())
    );
}

#[test]
fn diagonal_new_faces_replaces_the_split_face() {
    let mut sq = square();
    let before = sq
        .topo
        .face_keys()
        .find(|&f| f != sq.topo.universe())
        .unwrap();

    sq.topo
        .add_edge_new_faces(sq.nodes[0], sq.nodes[2], vec![c(0.0, 0.0), c(1.0, 1.0)])
        .unwrap();
    assert_eq!(sq.topo.face_count(), 3);
    // NewFaces policy: the split face is gone, both sides are fresh.
    assert!(sq.topo.face(before).is_none());

    let lower = sq.topo.find_face_containing_point(c(0.75, 0.25)).unwrap();
    let upper = sq.topo.find_face_containing_point(c(0.25, 0.75)).unwrap();
    assert_ne!(lower, upper);
    assert_ne!(lower, sq.topo.universe());
    assert_ne!(upper, sq.topo.universe());

    let rings = sq.topo.face_geometry(lower).unwrap();
    assert_eq!(rings.len(), 1);
    assert_relative_eq!(geom::signed_area(&rings[0]), 0.5, epsilon = 1e-12);
}

#[test]
fn diagonal_mod_face_keeps_the_old_face_on_the_right() {
    let mut sq = square();
    let before = sq
        .topo
        .face_keys()
        .find(|&f| f != sq.topo.universe())
        .unwrap();

    let diag = sq
        .topo
        .add_edge_mod_face(sq.nodes[0], sq.nodes[2], vec![c(0.0, 0.0), c(1.0, 1.0)])
        .unwrap();
    assert_eq!(sq.topo.face_count(), 3);

    // The old face survives right of the diagonal (the lower-right half).
    assert_eq!(sq.topo.edge(diag).unwrap().right_face, before);
    assert_eq!(
        sq.topo.find_face_containing_point(c(0.75, 0.25)).unwrap(),
        before
    );
    let upper = sq.topo.find_face_containing_point(c(0.25, 0.75)).unwrap();
    assert_ne!(upper, before);
    assert_eq!(sq.topo.edge(diag).unwrap().left_face, upper);
}

#[test]
fn removing_the_diagonal_inverts_the_split() {
    let mut sq = square();
    let diag = sq
        .topo
        .add_edge_new_faces(sq.nodes[0], sq.nodes[2], vec![c(0.0, 0.0), c(1.0, 1.0)])
        .unwrap();
    let lower = sq.topo.find_face_containing_point(c(0.75, 0.25)).unwrap();
    let upper = sq.topo.find_face_containing_point(c(0.25, 0.75)).unwrap();

    let flood = sq.topo.rem_edge_new_face(diag).unwrap();
    assert_eq!(sq.topo.face_count(), 2);
    assert_ne!(flood, lower);
    assert_ne!(flood, upper);
    assert!(sq.topo.face(lower).is_none());
    assert!(sq.topo.face(upper).is_none());
    assert_eq!(sq.topo.find_face_containing_point(c(0.5, 0.5)).unwrap(), flood);

    let rings = sq.topo.face_geometry(flood).unwrap();
    assert_eq!(rings.len(), 1);
    assert_relative_eq!(geom::signed_area(&rings[0]), 1.0, epsilon = 1e-12);
}

#[test]
fn removing_the_diagonal_mod_face_keeps_the_right_face() {
    let mut sq = square();
    let diag = sq
        .topo
        .add_edge_new_faces(sq.nodes[0], sq.nodes[2], vec![c(0.0, 0.0), c(1.0, 1.0)])
        .unwrap();
    let lower = sq.topo.edge(diag).unwrap().right_face;
    let upper = sq.topo.edge(diag).unwrap().left_face;

    let flood = sq.topo.rem_edge_mod_face(diag).unwrap();
    assert_eq!(flood, lower);
    assert!(sq.topo.face(upper).is_none());
    assert_eq!(sq.topo.find_face_containing_point(c(0.25, 0.75)).unwrap(), lower);
}

#[test]
fn removing_a_boundary_edge_floods_with_universe() {
    let mut sq = square();
    let face = sq
        .topo
        .face_keys()
        .find(|&f| f != sq.topo.universe())
        .unwrap();
    let inner = sq.topo.add_iso_node(c(0.5, 0.5)).unwrap();
    assert_eq!(sq.topo.node(inner).unwrap().containing_face, Some(face));

    let flood = sq.topo.rem_edge_new_face(sq.edges[0]).unwrap();
    assert_eq!(flood, sq.topo.universe());
    assert_eq!(sq.topo.face_count(), 1);
    // The bounded face dissolved; its isolated node now sits in the universe.
    assert!(sq.topo.face(face).is_none());
    assert_eq!(
        sq.topo.node(inner).unwrap().containing_face,
        Some(sq.topo.universe())
    );
}

#[test]
fn split_and_heal_round_trip_on_a_face_boundary() {
    let mut sq = square();
    let face = sq
        .topo
        .face_keys()
        .find(|&f| f != sq.topo.universe())
        .unwrap();

    let node = sq.topo.mod_edge_split(sq.edges[0], c(0.5, 0.0)).unwrap();
    assert_eq!(sq.topo.edge_count(), 5);
    assert_eq!(sq.topo.face_count(), 2);
    // Both halves still bound the same face.
    for key in sq.topo.incident_edges(node) {
        assert_eq!(sq.topo.edge(key).unwrap().left_face, face);
        assert_eq!(sq.topo.edge(key).unwrap().right_face, sq.topo.universe());
    }
    let rings = sq.topo.face_geometry(face).unwrap();
    assert_eq!(rings.len(), 1);
    assert_relative_eq!(geom::signed_area(&rings[0]), 1.0, epsilon = 1e-12);

    let tail = sq
        .topo
        .incident_edges(node)
        .into_iter()
        .find(|&k| k != sq.edges[0])
        .unwrap();
    let removed = sq.topo.mod_edge_heal(sq.edges[0], tail).unwrap();
    assert_eq!(removed, node);
    assert_eq!(sq.topo.edge_count(), 4);
    let merged = sq.topo.edge(sq.edges[0]).unwrap();
    assert_eq!(merged.coords, vec![c(0.0, 0.0), c(0.5, 0.0), c(1.0, 0.0)]);
    assert_eq!(merged.left_face, face);
}

#[test]
fn lifecycle_events_fire_in_order() {
    let mut t = topo();
    let log: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));
    for (kind, tag) in [
        (EventKind::AddNode, "addnode"),
        (EventKind::RemoveNode, "removenode"),
        (EventKind::AddEdge, "addedge"),
        (EventKind::ModEdge, "modedge"),
        (EventKind::RemoveEdge, "removeedge"),
        (EventKind::AddFace, "addface"),
        (EventKind::ModFace, "modface"),
        (EventKind::RemoveFace, "removeface"),
    ] {
        let log = Rc::clone(&log);
        t.on(kind, Box::new(move |_| log.borrow_mut().push(tag)));
    }

    let a = t.add_iso_node(c(0.0, 0.0)).unwrap();
    let b = t.add_iso_node(c(1.0, 0.0)).unwrap();
    let apex = t.add_iso_node(c(0.0, 1.0)).unwrap();
    t.add_edge_new_faces(a, b, vec![c(0.0, 0.0), c(1.0, 0.0)]).unwrap();
    t.add_edge_new_faces(b, apex, vec![c(1.0, 0.0), c(0.0, 1.0)]).unwrap();
    let closing = t
        .add_edge_new_faces(apex, a, vec![c(0.0, 1.0), c(0.0, 0.0)])
        .unwrap();
    assert_eq!(
        *log.borrow(),
        vec![
            "addnode", "addnode", "addnode", "addedge", "addedge", "addedge", "addface"
        ]
    );

    log.borrow_mut().clear();
    t.rem_edge_new_face(closing).unwrap();
    assert_eq!(*log.borrow(), vec!["removeedge", "removeface"]);
}

#[test]
fn observers_can_be_unregistered() {
    let mut t = topo();
    let count = Rc::new(RefCell::new(0));
    let seen = Rc::clone(&count);
    let id = t.on(EventKind::AddNode, Box::new(move |_| *seen.borrow_mut() += 1));

    t.add_iso_node(c(0.0, 0.0)).unwrap();
    t.un(id);
    t.add_iso_node(c(1.0, 0.0)).unwrap();
    assert_eq!(*count.borrow(), 1);
}

#[test]
fn closed_edge_makes_an_island() {
    let mut t = topo();
    let a = t.add_iso_node(c(0.0, 0.0)).unwrap();
    let ring = vec![c(0.0, 0.0), c(2.0, 0.0), c(1.0, 2.0), c(0.0, 0.0)];
    let e = t.add_edge_new_faces(a, a, ring).unwrap();

    assert_eq!(t.face_count(), 2);
    let face = t.face_keys().find(|&f| f != t.universe()).unwrap();
    let data = t.edge(e).unwrap();
    // Counter-clockwise ring: the island interior is on the left.
    assert_eq!(data.left_face, face);
    assert_eq!(data.right_face, t.universe());
    assert_eq!(t.find_face_containing_point(c(1.0, 0.5)).unwrap(), face);

    let flood = t.rem_edge_new_face(e).unwrap();
    assert_eq!(flood, t.universe());
    assert_eq!(t.face_count(), 1);
    assert_eq!(t.node(a).unwrap().containing_face, Some(t.universe()));
}

#[test]
fn iso_edge_between_different_faces_rejected() {
    let mut sq = square();
    let inner = sq.topo.add_iso_node(c(0.5, 0.5)).unwrap();
    let outer = sq.topo.add_iso_node(c(3.0, 3.0)).unwrap();
    assert!(matches!(
        sq.topo
            .add_iso_edge(inner, outer, vec![c(0.5, 0.5), c(3.0, 3.0)]),
        Err(Error::FacesMismatch)
    ));
    // Both nodes stay isolated in their faces.
    assert!(sq.topo.node(inner).unwrap().containing_face.is_some());
    assert!(sq.topo.node(outer).unwrap().containing_face.is_some());
}

#[test]
fn crossing_and_coincident_curves_leave_the_topology_untouched() {
    let mut sq = square();
    let before_edges = sq.topo.edge_count();
    let before_faces = sq.topo.face_count();

    assert!(matches!(
        sq.topo.add_edge_new_faces(
            sq.nodes[0],
            sq.nodes[1],
            vec![c(0.0, 0.0), c(1.0, 0.0)],
        ),
        Err(Error::CoincidentEdge(_))
    ));
    assert!(matches!(
        sq.topo.add_edge_new_faces(
            sq.nodes[0],
            sq.nodes[2],
            vec![c(0.0, 0.0), c(1.5, 0.5), c(1.0, 1.0)],
        ),
        Err(Error::CrossesEdge(_))
    ));
    assert_eq!(sq.topo.edge_count(), before_edges);
    assert_eq!(sq.topo.face_count(), before_faces);
}
