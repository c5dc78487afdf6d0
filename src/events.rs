// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lifecycle event notification.
//!
//! Observers register per event kind and are invoked synchronously after the
//! corresponding registry commit. Callbacks receive only the event payload,
//! never access to the topology, so they cannot re-enter a mutation in
//! flight.

use rustc_hash::FxHashMap;

use crate::keys::{EdgeKey, FaceKey, NodeKey};

/// The eight lifecycle events of a planar topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    AddNode,
    RemoveNode,
    AddEdge,
    ModEdge,
    RemoveEdge,
    AddFace,
    ModFace,
    RemoveFace,
}

/// An event payload: the kind plus the affected entity key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    AddNode(NodeKey),
    RemoveNode(NodeKey),
    AddEdge(EdgeKey),
    ModEdge(EdgeKey),
    RemoveEdge(EdgeKey),
    AddFace(FaceKey),
    ModFace(FaceKey),
    RemoveFace(FaceKey),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::AddNode(_) => EventKind::AddNode,
            Event::RemoveNode(_) => EventKind::RemoveNode,
            Event::AddEdge(_) => EventKind::AddEdge,
            Event::ModEdge(_) => EventKind::ModEdge,
            Event::RemoveEdge(_) => EventKind::RemoveEdge,
            Event::AddFace(_) => EventKind::AddFace,
            Event::ModFace(_) => EventKind::ModFace,
            Event::RemoveFace(_) => EventKind::RemoveFace,
        }
    }
}

/// Handle returned by [`ObserverTable::on`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Callback = Box<dyn FnMut(&Event)>;

/// Registry of event observers keyed by event kind.
#[derive(Default)]
pub struct ObserverTable {
    next_id: u64,
    observers: FxHashMap<EventKind, Vec<(ObserverId, Callback)>>,
}

impl std::fmt::Debug for ObserverTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverTable")
            .field("next_id", &self.next_id)
            .field(
                "counts",
                &self
                    .observers
                    .iter()
                    .map(|(k, v)| (*k, v.len()))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl ObserverTable {
    /// Registers a callback for one event kind.
    pub fn on(&mut self, kind: EventKind, callback: Callback) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.observers.entry(kind).or_default().push((id, callback));
        id
    }

    /// Unregisters a previously registered callback. Unknown ids are ignored.
    pub fn un(&mut self, id: ObserverId) {
        for bucket in self.observers.values_mut() {
            bucket.retain(|(oid, _)| *oid != id);
        }
    }

    /// Invokes every observer registered for the event's kind.
    pub fn emit(&mut self, event: &Event) {
        if let Some(bucket) = self.observers.get_mut(&event.kind()) {
            for (_, callback) in bucket.iter_mut() {
                callback(event);
            }
        }
    }
}
