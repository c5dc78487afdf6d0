// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bounding-box spatial index over arena keys.
//!
//! A grid-based spatial hash: each item is bucketed by the cell containing
//! its box center, and queries expand their window by the largest half
//! extent seen so far before scanning candidate cells. This keeps inserts
//! O(1) and point/window queries proportional to local density.

use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::geom::Rect;

/// A spatial index mapping keys to axis-aligned bounding boxes.
#[derive(Debug)]
pub struct RectIndex<K> {
    cell_size: f64,
    grid: FxHashMap<(i64, i64), Vec<K>>,
    rects: FxHashMap<K, Rect>,
    // Monotonic query-expansion bounds; removals leave them in place.
    max_half_w: f64,
    max_half_h: f64,
}

impl<K: Copy + Eq + Hash> RectIndex<K> {
    /// Creates an empty index with the given grid cell size.
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size: cell_size.max(f64::MIN_POSITIVE),
            grid: FxHashMap::default(),
            rects: FxHashMap::default(),
            max_half_w: 0.0,
            max_half_h: 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Inserts a key with its bounding box, replacing any previous entry.
    pub fn insert(&mut self, key: K, rect: Rect) {
        self.remove(key);
        let cell = self.cell_of(rect);
        self.grid.entry(cell).or_default().push(key);
        self.rects.insert(key, rect);
        self.max_half_w = self.max_half_w.max((rect.max_x - rect.min_x) / 2.0);
        self.max_half_h = self.max_half_h.max((rect.max_y - rect.min_y) / 2.0);
    }

    /// Removes a key. Unknown keys are ignored.
    pub fn remove(&mut self, key: K) {
        if let Some(rect) = self.rects.remove(&key) {
            let cell = self.cell_of(rect);
            if let Some(bucket) = self.grid.get_mut(&cell) {
                bucket.retain(|k| *k != key);
                if bucket.is_empty() {
                    self.grid.remove(&cell);
                }
            }
        }
    }

    /// Bulk-loads items into the index.
    pub fn load(&mut self, items: impl IntoIterator<Item = (K, Rect)>) {
        for (key, rect) in items {
            self.insert(key, rect);
        }
    }

    /// Removes all entries.
    pub fn clear(&mut self) {
        self.grid.clear();
        self.rects.clear();
        self.max_half_w = 0.0;
        self.max_half_h = 0.0;
    }

    /// Returns the stored bounding box for a key.
    pub fn rect_of(&self, key: K) -> Option<Rect> {
        self.rects.get(&key).copied()
    }

    /// All keys whose boxes intersect the query window.
    pub fn search(&self, window: Rect) -> Vec<K> {
        let mut out = Vec::new();
        self.for_candidates(window, |key, rect| {
            if rect.intersects(window) {
                out.push(key);
            }
        });
        out
    }

    /// True if any box intersects the query window.
    pub fn collides(&self, window: Rect) -> bool {
        let mut hit = false;
        self.for_candidates(window, |_, rect| {
            if rect.intersects(window) {
                hit = true;
            }
        });
        hit
    }

    fn for_candidates(&self, window: Rect, mut visit: impl FnMut(K, Rect)) {
        let expanded = Rect {
            min_x: window.min_x - self.max_half_w,
            min_y: window.min_y - self.max_half_h,
            max_x: window.max_x + self.max_half_w,
            max_y: window.max_y + self.max_half_h,
        };
        let (cx0, cy0) = self.cell_coords(expanded.min_x, expanded.min_y);
        let (cx1, cy1) = self.cell_coords(expanded.max_x, expanded.max_y);

        let span = (cx1 - cx0 + 1).saturating_mul(cy1 - cy0 + 1);
        if span as usize > self.grid.len() {
            // Window covers more cells than exist; walk the grid instead.
            for (cell, bucket) in &self.grid {
                if cell.0 >= cx0 && cell.0 <= cx1 && cell.1 >= cy0 && cell.1 <= cy1 {
                    for &key in bucket {
                        visit(key, self.rects[&key]);
                    }
                }
            }
            return;
        }

        for cx in cx0..=cx1 {
            for cy in cy0..=cy1 {
                if let Some(bucket) = self.grid.get(&(cx, cy)) {
                    for &key in bucket {
                        visit(key, self.rects[&key]);
                    }
                }
            }
        }
    }

    fn cell_of(&self, rect: Rect) -> (i64, i64) {
        let c = rect.center();
        self.cell_coords(c.x, c.y)
    }

    fn cell_coords(&self, x: f64, y: f64) -> (i64, i64) {
        (
            (x / self.cell_size).floor() as i64,
            (y / self.cell_size).floor() as i64,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Coord;
    use slotmap::{DefaultKey, SlotMap};

    fn keys(n: usize) -> Vec<DefaultKey> {
        let mut sm: SlotMap<DefaultKey, ()> = SlotMap::with_key();
        (0..n).map(|_| sm.insert(())).collect()
    }

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Rect {
        Rect {
            min_x: x0,
            min_y: y0,
            max_x: x1,
            max_y: y1,
        }
    }

    #[test]
    fn insert_search_remove() {
        let ks = keys(3);
        let mut index = RectIndex::new(1.0);
        index.insert(ks[0], rect(0.0, 0.0, 1.0, 1.0));
        index.insert(ks[1], rect(10.0, 10.0, 11.0, 11.0));
        index.insert(ks[2], rect(0.5, 0.5, 4.0, 4.0));

        let found = index.search(rect(0.0, 0.0, 2.0, 2.0));
        assert!(found.contains(&ks[0]));
        assert!(found.contains(&ks[2]));
        assert!(!found.contains(&ks[1]));

        index.remove(ks[0]);
        let found = index.search(rect(0.0, 0.0, 0.4, 0.4));
        assert!(!found.contains(&ks[0]));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn collides_matches_search() {
        let ks = keys(1);
        let mut index = RectIndex::new(2.0);
        index.insert(ks[0], rect(5.0, 5.0, 6.0, 6.0));
        assert!(index.collides(rect(5.5, 5.5, 5.6, 5.6)));
        assert!(!index.collides(rect(100.0, 100.0, 101.0, 101.0)));
    }

    #[test]
    fn large_items_found_from_far_cells() {
        let ks = keys(1);
        let mut index = RectIndex::new(1.0);
        // Box spanning many cells, centered far from the query window.
        index.insert(ks[0], rect(-50.0, -1.0, 50.0, 1.0));
        assert!(index.collides(rect(49.0, 0.0, 49.5, 0.5)));
    }

    #[test]
    fn point_boxes() {
        let ks = keys(2);
        let mut index = RectIndex::new(1.0);
        index.insert(ks[0], Rect::point(Coord::new(3.0, 3.0)));
        index.insert(ks[1], Rect::point(Coord::new(-3.0, -3.0)));
        let found = index.search(Rect::point(Coord::new(3.0, 3.0)));
        assert_eq!(found, vec![ks[0]]);
    }

    #[test]
    fn clear_and_load() {
        let ks = keys(2);
        let mut index = RectIndex::new(1.0);
        index.load([(ks[0], rect(0.0, 0.0, 1.0, 1.0)), (ks[1], rect(2.0, 2.0, 3.0, 3.0))]);
        assert_eq!(index.len(), 2);
        index.clear();
        assert!(index.is_empty());
        assert!(!index.collides(rect(0.0, 0.0, 5.0, 5.0)));
    }
}
