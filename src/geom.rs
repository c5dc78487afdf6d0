// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometry predicate kernel.
//!
//! A closed set of pure functions over coordinate sequences: simplicity,
//! DE-9IM relate, intersection, distance, containment, signed area, azimuth,
//! line splitting and ring stitching. The topology engine consumes these as
//! black-box predicates and never performs coordinate math anywhere else.

/// Tolerance for on-segment and coincidence tests.
const EPS: f64 = 1e-9;

/// A 2D coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

impl Coord {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// True if the two coordinates are within [`EPS`] of each other.
    pub fn close_to(self, other: Coord) -> bool {
        (self.x - other.x).abs() <= EPS && (self.y - other.y).abs() <= EPS
    }
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Rect {
    /// Degenerate box around a single point.
    pub fn point(c: Coord) -> Self {
        Self {
            min_x: c.x,
            min_y: c.y,
            max_x: c.x,
            max_y: c.y,
        }
    }

    /// Bounding box of a coordinate sequence. `None` for an empty sequence.
    pub fn of_coords(coords: &[Coord]) -> Option<Self> {
        let first = coords.first()?;
        let mut r = Rect::point(*first);
        for c in &coords[1..] {
            r.min_x = r.min_x.min(c.x);
            r.min_y = r.min_y.min(c.y);
            r.max_x = r.max_x.max(c.x);
            r.max_y = r.max_y.max(c.y);
        }
        Some(r)
    }

    /// Box grown by `d` on every side.
    pub fn expanded(self, d: f64) -> Self {
        Self {
            min_x: self.min_x - d,
            min_y: self.min_y - d,
            max_x: self.max_x + d,
            max_y: self.max_y + d,
        }
    }

    /// Smallest box covering both.
    pub fn union(self, other: Rect) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn intersects(self, other: Rect) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    pub fn contains(self, c: Coord) -> bool {
        c.x >= self.min_x && c.x <= self.max_x && c.y >= self.min_y && c.y <= self.max_y
    }

    pub fn center(self) -> Coord {
        Coord::new((self.min_x + self.max_x) / 2.0, (self.min_y + self.max_y) / 2.0)
    }
}

/// Azimuth of the direction a→b, measured clockwise from north (+y),
/// normalized to `[0, 2π)`. `None` for a zero-length direction.
pub fn azimuth(a: Coord, b: Coord) -> Option<f64> {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    if dx.abs() <= EPS && dy.abs() <= EPS {
        return None;
    }
    let mut az = dx.atan2(dy);
    if az < 0.0 {
        az += 2.0 * std::f64::consts::PI;
    }
    Some(az)
}

/// Signed area of a ring (shoelace). Positive for counter-clockwise winding
/// in a y-up coordinate system. The ring may or may not repeat its first
/// point at the end.
pub fn signed_area(ring: &[Coord]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[(i + 1) % ring.len()];
        sum += a.x * b.y - b.x * a.y;
    }
    sum / 2.0
}

/// Point-in-ring containment by the non-zero winding number rule.
///
/// Boundary points are not reliably classified; callers test only points
/// known to be off the ring.
pub fn point_in_ring(p: Coord, ring: &[Coord]) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let mut winding = 0i32;
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[(i + 1) % ring.len()];
        if a.y <= p.y {
            if b.y > p.y && cross(a, b, p) > 0.0 {
                winding += 1;
            }
        } else if b.y <= p.y && cross(a, b, p) < 0.0 {
            winding -= 1;
        }
    }
    winding != 0
}

/// Minimum distance from a point to a polyline.
pub fn distance(p: Coord, line: &[Coord]) -> f64 {
    let mut best = f64::INFINITY;
    if line.len() == 1 {
        return ((p.x - line[0].x).powi(2) + (p.y - line[0].y).powi(2)).sqrt();
    }
    for seg in line.windows(2) {
        best = best.min(point_segment_distance(p, seg[0], seg[1]));
    }
    best
}

/// True if the polyline has no self-intersections apart from the shared
/// first/last point of a closed curve, and no zero-length segments.
pub fn is_simple(line: &[Coord]) -> bool {
    if line.len() < 2 {
        return false;
    }
    for seg in line.windows(2) {
        if seg[0].close_to(seg[1]) {
            return false;
        }
    }
    let closed = line[0].close_to(line[line.len() - 1]);
    let nseg = line.len() - 1;
    for i in 0..nseg {
        for j in (i + 1)..nseg {
            let hit = seg_seg(line[i], line[i + 1], line[j], line[j + 1]);
            match hit {
                SegSeg::Disjoint => {}
                SegSeg::Overlap(_, _) => return false,
                SegSeg::Point(p) => {
                    if j == i + 1 {
                        // Chain neighbors may only share their common vertex.
                        if !p.close_to(line[j]) {
                            return false;
                        }
                    } else if closed && i == 0 && j == nseg - 1 {
                        if !p.close_to(line[0]) {
                            return false;
                        }
                    } else {
                        return false;
                    }
                }
            }
        }
    }
    true
}

/// True if the two polylines share at least one point.
pub fn intersects(a: &[Coord], b: &[Coord]) -> bool {
    for sa in a.windows(2) {
        for sb in b.windows(2) {
            if !matches!(seg_seg(sa[0], sa[1], sb[0], sb[1]), SegSeg::Disjoint) {
                return true;
            }
        }
    }
    false
}

/// Splits a polyline at a point lying on its interior.
///
/// Returns the two halves, both containing the split point. `None` if the
/// point is not on the line or coincides with one of its endpoints. When the
/// point matches an interior vertex the halves reuse the stored vertex, so
/// concatenating them reproduces the original sequence exactly.
pub fn split(line: &[Coord], p: Coord, tol: f64) -> Option<(Vec<Coord>, Vec<Coord>)> {
    if line.len() < 2 {
        return None;
    }
    let tol = tol.max(EPS);
    if within(p, line[0], tol) || within(p, line[line.len() - 1], tol) {
        return None;
    }
    // Vertex hit first, to preserve exact coordinates.
    for (k, v) in line.iter().enumerate().skip(1).take(line.len() - 2) {
        if within(p, *v, tol) {
            return Some((line[..=k].to_vec(), line[k..].to_vec()));
        }
    }
    for i in 0..line.len() - 1 {
        if point_segment_distance(p, line[i], line[i + 1]) <= tol {
            let mut head = line[..=i].to_vec();
            head.push(p);
            let mut tail = vec![p];
            tail.extend_from_slice(&line[i + 1..]);
            return Some((head, tail));
        }
    }
    None
}

/// Stitches a collection of linestrings into closed rings.
///
/// Dangling lines (an endpoint matched by no other line) are dropped
/// iteratively, then the remaining lines are chained end-to-end by endpoint
/// coincidence. Returned rings are closed (last point repeats the first).
/// Lines that cannot be closed are discarded.
pub fn polygonize(lines: &[Vec<Coord>]) -> Vec<Vec<Coord>> {
    let mut pool: Vec<Vec<Coord>> = lines
        .iter()
        .filter(|l| l.len() >= 2)
        .cloned()
        .collect();

    // Drop dangles until every remaining endpoint is shared.
    loop {
        let mut drop = vec![false; pool.len()];
        let mut changed = false;
        for (i, line) in pool.iter().enumerate() {
            let first = line[0];
            let last = line[line.len() - 1];
            if first.close_to(last) {
                continue; // already a ring
            }
            for &end in &[first, last] {
                let mut degree = 0;
                for (j, other) in pool.iter().enumerate() {
                    if drop[j] {
                        continue;
                    }
                    if other[0].close_to(end) {
                        degree += 1;
                    }
                    if other[other.len() - 1].close_to(end) {
                        degree += 1;
                    }
                }
                // The line itself contributes one occurrence.
                if degree < 2 {
                    drop[i] = true;
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
        pool = pool
            .into_iter()
            .zip(drop)
            .filter(|(_, d)| !d)
            .map(|(l, _)| l)
            .collect();
    }

    let mut rings = Vec::new();
    let mut used = vec![false; pool.len()];

    for i in 0..pool.len() {
        if used[i] {
            continue;
        }
        used[i] = true;
        let mut ring = pool[i].clone();
        if ring[0].close_to(ring[ring.len() - 1]) {
            rings.push(ring);
            continue;
        }
        let start = ring[0];
        loop {
            let tail = ring[ring.len() - 1];
            if tail.close_to(start) {
                rings.push(ring);
                break;
            }
            let mut extended = false;
            for (j, cand) in pool.iter().enumerate() {
                if used[j] {
                    continue;
                }
                if cand[0].close_to(tail) {
                    used[j] = true;
                    ring.extend_from_slice(&cand[1..]);
                    extended = true;
                    break;
                }
                if cand[cand.len() - 1].close_to(tail) {
                    used[j] = true;
                    ring.extend(cand[..cand.len() - 1].iter().rev().copied());
                    extended = true;
                    break;
                }
            }
            if !extended {
                break; // open chain, discard
            }
        }
    }

    rings
}

// =============================================================================
// DE-9IM relate for polyline pairs
// =============================================================================

/// Dimension value of one intersection-matrix cell: -1 = empty (`F`),
/// otherwise 0, 1 or 2.
type Dim = i8;

/// A DE-9IM intersection matrix between two polylines.
///
/// Cells are ordered interior/boundary/exterior of the first geometry
/// against interior/boundary/exterior of the second, row-major, the same
/// order a pattern string is read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionMatrix {
    dims: [Dim; 9],
}

impl IntersectionMatrix {
    /// Tests the matrix against a 9-character pattern: `T` non-empty,
    /// `F` empty, `*` anything, `0`/`1`/`2` the exact dimension.
    pub fn matches(&self, pattern: &str) -> bool {
        debug_assert_eq!(pattern.len(), 9);
        self.dims
            .iter()
            .zip(pattern.chars())
            .all(|(&d, p)| match p {
                '*' => true,
                'T' => d >= 0,
                'F' => d < 0,
                '0' => d == 0,
                '1' => d == 1,
                '2' => d == 2,
                _ => false,
            })
    }
}

/// Computes the DE-9IM matrix between two polylines.
///
/// The boundary of a polyline is its two endpoints, closed or not (the
/// endpoint boundary-node rule). Crossing checks rely on this: two closed
/// curves meeting only at their shared endpoint touch at boundaries rather
/// than crossing at interiors.
pub fn relate(a: &[Coord], b: &[Coord]) -> IntersectionMatrix {
    let bnd_a = boundary(a);
    let bnd_b = boundary(b);

    // Interior/interior: dimension of the overlap between curve interiors.
    let mut ii: Dim = -1;
    for sa in a.windows(2) {
        for sb in b.windows(2) {
            match seg_seg(sa[0], sa[1], sb[0], sb[1]) {
                SegSeg::Disjoint => {}
                SegSeg::Overlap(p, q) => {
                    if !p.close_to(q) {
                        ii = 1;
                    }
                }
                SegSeg::Point(p) => {
                    if ii < 0 && !in_set(p, &bnd_a) && !in_set(p, &bnd_b) {
                        ii = 0;
                    }
                }
            }
        }
    }

    let dim_of = |hit: bool| if hit { 0 } else { -1 };

    // Boundary rows/columns from endpoint membership.
    let ib = dim_of(
        bnd_b
            .iter()
            .any(|&q| on_line(q, a) && !in_set(q, &bnd_a)),
    );
    let bi = dim_of(
        bnd_a
            .iter()
            .any(|&q| on_line(q, b) && !in_set(q, &bnd_b)),
    );
    let bb = dim_of(bnd_a.iter().any(|&q| in_set(q, &bnd_b)));
    let be = dim_of(bnd_a.iter().any(|&q| !on_line(q, b)));
    let eb = dim_of(bnd_b.iter().any(|&q| !on_line(q, a)));

    // Exterior columns: a curve escapes the other unless fully covered.
    let ie: Dim = if covered_by(a, b) { -1 } else { 1 };
    let ei: Dim = if covered_by(b, a) { -1 } else { 1 };

    IntersectionMatrix {
        dims: [ii, ib, ie, bi, bb, be, ei, eb, 2],
    }
}

/// Boundary point set of a polyline under the endpoint boundary-node rule.
/// A closed polyline contributes a single boundary point.
fn boundary(line: &[Coord]) -> Vec<Coord> {
    if line.len() < 2 {
        Vec::new()
    } else if line[0].close_to(line[line.len() - 1]) {
        vec![line[0]]
    } else {
        vec![line[0], line[line.len() - 1]]
    }
}

fn in_set(p: Coord, set: &[Coord]) -> bool {
    set.iter().any(|&q| q.close_to(p))
}

/// True if `p` lies on the polyline (within tolerance).
fn on_line(p: Coord, line: &[Coord]) -> bool {
    line.windows(2)
        .any(|seg| point_segment_distance(p, seg[0], seg[1]) <= EPS)
}

/// True if every point of `a` lies on `b`.
///
/// Checked per segment of `a`: the union of its collinear overlaps with
/// segments of `b` must cover the whole segment.
fn covered_by(a: &[Coord], b: &[Coord]) -> bool {
    for sa in a.windows(2) {
        let len = ((sa[1].x - sa[0].x).powi(2) + (sa[1].y - sa[0].y).powi(2)).sqrt();
        if len <= EPS {
            continue;
        }
        let mut intervals: Vec<(f64, f64)> = Vec::new();
        for sb in b.windows(2) {
            if let SegSeg::Overlap(p, q) = seg_seg(sa[0], sa[1], sb[0], sb[1]) {
                let t0 = param_on_segment(p, sa[0], sa[1]);
                let t1 = param_on_segment(q, sa[0], sa[1]);
                intervals.push((t0.min(t1), t0.max(t1)));
            }
        }
        intervals.sort_by(|x, y| x.0.total_cmp(&y.0));
        let mut covered_to = 0.0;
        for (lo, hi) in intervals {
            if lo > covered_to + EPS / len {
                return false;
            }
            covered_to = covered_to.max(hi);
        }
        if covered_to < 1.0 - EPS / len {
            return false;
        }
    }
    true
}

// =============================================================================
// Segment primitives
// =============================================================================

/// Classification of a segment/segment intersection.
enum SegSeg {
    Disjoint,
    /// Single shared point.
    Point(Coord),
    /// Collinear shared portion (may be degenerate).
    Overlap(Coord, Coord),
}

fn cross(a: Coord, b: Coord, c: Coord) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn within(p: Coord, q: Coord, tol: f64) -> bool {
    (p.x - q.x).abs() <= tol && (p.y - q.y).abs() <= tol
}

fn point_segment_distance(p: Coord, a: Coord, b: Coord) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq <= EPS * EPS {
        return ((p.x - a.x).powi(2) + (p.y - a.y).powi(2)).sqrt();
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    let cx = a.x + t * dx;
    let cy = a.y + t * dy;
    ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt()
}

/// Parameter of a point known to lie on segment a→b, in `[0, 1]`.
fn param_on_segment(p: Coord, a: Coord, b: Coord) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    if dx.abs() >= dy.abs() {
        if dx.abs() <= EPS {
            0.0
        } else {
            (p.x - a.x) / dx
        }
    } else {
        (p.y - a.y) / dy
    }
}

fn seg_seg(p1: Coord, p2: Coord, q1: Coord, q2: Coord) -> SegSeg {
    // Scale-aware zero test for the orientation products.
    let scale = (p2.x - p1.x)
        .abs()
        .max((p2.y - p1.y).abs())
        .max((q2.x - q1.x).abs())
        .max((q2.y - q1.y).abs())
        .max(1.0);
    let zero = EPS * scale;

    let d1 = cross(q1, q2, p1);
    let d2 = cross(q1, q2, p2);
    let d3 = cross(p1, p2, q1);
    let d4 = cross(p1, p2, q2);

    if d1.abs() <= zero && d2.abs() <= zero && d3.abs() <= zero && d4.abs() <= zero {
        // Collinear: project onto the dominant axis of p1→p2.
        let t = |c: Coord| param_on_segment(c, p1, p2);
        let (mut t0, mut t1) = (t(q1), t(q2));
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        let lo = t0.max(0.0);
        let hi = t1.min(1.0);
        if lo > hi + EPS {
            return SegSeg::Disjoint;
        }
        let at = |t: f64| Coord::new(p1.x + t * (p2.x - p1.x), p1.y + t * (p2.y - p1.y));
        let a = at(lo.clamp(0.0, 1.0));
        let b = at(hi.clamp(0.0, 1.0));
        if a.close_to(b) {
            return SegSeg::Point(a);
        }
        return SegSeg::Overlap(a, b);
    }

    if (d1 > zero && d2 > zero)
        || (d1 < -zero && d2 < -zero)
        || (d3 > zero && d4 > zero)
        || (d4 < -zero && d3 < -zero)
    {
        return SegSeg::Disjoint;
    }

    // Endpoint touching an endpoint or a segment interior: report the exact
    // endpoint coordinate.
    if d1.abs() <= zero && on_span(p1, q1, q2) {
        return SegSeg::Point(p1);
    }
    if d2.abs() <= zero && on_span(p2, q1, q2) {
        return SegSeg::Point(p2);
    }
    if d3.abs() <= zero && on_span(q1, p1, p2) {
        return SegSeg::Point(q1);
    }
    if d4.abs() <= zero && on_span(q2, p1, p2) {
        return SegSeg::Point(q2);
    }

    if (d1 > zero) != (d2 > zero) && (d3 > zero) != (d4 > zero) {
        // Proper crossing.
        let denom = d1 - d2;
        let t = d1 / denom;
        return SegSeg::Point(Coord::new(
            p1.x + t * (p2.x - p1.x),
            p1.y + t * (p2.y - p1.y),
        ));
    }

    SegSeg::Disjoint
}

/// True if a collinear point lies within the span of segment a→b.
fn on_span(p: Coord, a: Coord, b: Coord) -> bool {
    p.x >= a.x.min(b.x) - EPS
        && p.x <= a.x.max(b.x) + EPS
        && p.y >= a.y.min(b.y) - EPS
        && p.y <= a.y.max(b.y) + EPS
}
