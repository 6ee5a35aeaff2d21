//! Geometry kernel: angle math, segment/box intersection, point-rect
//! distance, the spatial hash grid, and octilinear snapping (spec.md §4.1,
//! "Geometry kernel"). Free functions over plain `[f64; 2]` points rather
//! than a geometry-crate wrapper type, since hot loops here run once per
//! station pair per relaxation pass.

use rustc_hash::FxHashMap;

pub type Point = [f64; 2];

/// Replace NaN/-Inf/+Inf with 0, per spec.md §7/§9's numeric-anomaly policy.
pub fn sanitize_f64(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

pub fn sub(a: Point, b: Point) -> Point {
    [a[0] - b[0], a[1] - b[1]]
}

pub fn add(a: Point, b: Point) -> Point {
    [a[0] + b[0], a[1] + b[1]]
}

pub fn scale(a: Point, k: f64) -> Point {
    [a[0] * k, a[1] * k]
}

pub fn dot(a: Point, b: Point) -> f64 {
    a[0] * b[0] + a[1] * b[1]
}

pub fn length(a: Point) -> f64 {
    dot(a, a).sqrt()
}

pub fn distance(a: Point, b: Point) -> f64 {
    length(sub(a, b))
}

/// Angle in radians of the vector `(dx, dy)`, in `(-pi, pi]`.
pub fn angle_of(dx: f64, dy: f64) -> f64 {
    dy.atan2(dx)
}

/// Round-half-to-even ("banker's rounding"), per spec.md §9: "specify
/// bank-rounding explicitly when porting (round half to even is acceptable
/// and more portable)".
pub fn round_half_even(x: f64) -> f64 {
    let floor = x.floor();
    let diff = x - floor;
    if (diff - 0.5).abs() < 1e-12 {
        if (floor as i64) % 2 == 0 {
            floor
        } else {
            floor + 1.0
        }
    } else {
        x.round()
    }
}

/// Octilinear direction index (0..7) nearest to `angle` radians. Index `i`
/// corresponds to angle `i * pi / 4`, with 0 = east, increasing
/// counter-clockwise.
pub fn snap_angle_index(angle: f64) -> u8 {
    let normalized = normalize_angle(angle);
    let idx = round_half_even(normalized / (std::f64::consts::PI / 4.0));
    (((idx as i64).rem_euclid(8)) as u8).min(7)
}

/// The canonical angle (radians) for octilinear direction index `idx`.
pub fn index_to_angle(idx: u8) -> f64 {
    (idx as f64) * std::f64::consts::PI / 4.0
}

/// Normalize an angle into `[0, 2*pi)`.
pub fn normalize_angle(angle: f64) -> f64 {
    let two_pi = std::f64::consts::TAU;
    let mut a = angle % two_pi;
    if a < 0.0 {
        a += two_pi;
    }
    a
}

/// Circular distance between two octilinear direction indices: `min(|d|, 8-|d|)`.
pub fn circular_distance(a: u8, b: u8) -> u8 {
    let diff = (a as i32 - b as i32).unsigned_abs() as u8;
    diff.min(8 - diff)
}

/// Absolute angular deviation, in degrees, between an observed radian angle
/// and the canonical direction of octilinear index `idx`.
pub fn angle_deviation_deg(observed: f64, idx: u8) -> f64 {
    let target = index_to_angle(idx);
    let mut diff = (normalize_angle(observed) - normalize_angle(target)).abs();
    if diff > std::f64::consts::PI {
        diff = std::f64::consts::TAU - diff;
    }
    diff.to_degrees()
}

/// Axis-aligned bounding box, used as a cheap pre-filter before exact
/// segment intersection / overlap tests.
#[derive(Debug, Clone, Copy)]
pub struct Aabb {
    pub min: Point,
    pub max: Point,
}

impl Aabb {
    pub fn of_segment(a: Point, b: Point) -> Self {
        Aabb {
            min: [a[0].min(b[0]), a[1].min(b[1])],
            max: [a[0].max(b[0]), a[1].max(b[1])],
        }
    }

    pub fn of_box(min: Point, max: Point) -> Self {
        Aabb { min, max }
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min[0] <= other.max[0]
            && self.max[0] >= other.min[0]
            && self.min[1] <= other.max[1]
            && self.max[1] >= other.min[1]
    }

    pub fn overlap_area(&self, other: &Aabb) -> f64 {
        let ox = (self.max[0].min(other.max[0]) - self.min[0].max(other.min[0])).max(0.0);
        let oy = (self.max[1].min(other.max[1]) - self.min[1].max(other.min[1])).max(0.0);
        ox * oy
    }
}

fn orientation(a: Point, b: Point, c: Point) -> f64 {
    (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])
}

fn on_segment(a: Point, b: Point, p: Point) -> bool {
    p[0] >= a[0].min(b[0])
        && p[0] <= a[0].max(b[0])
        && p[1] >= a[1].min(b[1])
        && p[1] <= a[1].max(b[1])
}

/// Exact segment/segment intersection test (including collinear overlap),
/// with an AABB pre-filter for speed (spec.md §4.2, step 7: "Uses
/// axis-aligned box pre-filter before exact intersection test").
pub fn segments_intersect(p1: Point, p2: Point, q1: Point, q2: Point) -> bool {
    if !Aabb::of_segment(p1, p2).overlaps(&Aabb::of_segment(q1, q2)) {
        return false;
    }
    let d1 = orientation(q1, q2, p1);
    let d2 = orientation(q1, q2, p2);
    let d3 = orientation(p1, p2, q1);
    let d4 = orientation(p1, p2, q2);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    if d1 == 0.0 && on_segment(q1, q2, p1) {
        return true;
    }
    if d2 == 0.0 && on_segment(q1, q2, p2) {
        return true;
    }
    if d3 == 0.0 && on_segment(p1, p2, q1) {
        return true;
    }
    if d4 == 0.0 && on_segment(p1, p2, q2) {
        return true;
    }
    false
}

/// Shortest distance from `point` to the axis-aligned rectangle `[min, max]`.
/// Zero if `point` is inside the rectangle.
pub fn point_rect_distance(point: Point, min: Point, max: Point) -> f64 {
    let dx = (min[0] - point[0]).max(0.0).max(point[0] - max[0]);
    let dy = (min[1] - point[1]).max(0.0).max(point[1] - max[1]);
    (dx * dx + dy * dy).sqrt()
}

/// A uniform spatial hash grid bucketing point indices by cell, used to
/// bound pairwise-interaction work in repulsion, junction spread, and
/// crossing-repel broad phases (spec.md §4.2, step 4).
pub struct SpatialGrid {
    cell_size: f64,
    buckets: FxHashMap<(i64, i64), Vec<usize>>,
}

impl SpatialGrid {
    pub fn new(cell_size: f64) -> Self {
        SpatialGrid {
            cell_size: cell_size.max(1e-6),
            buckets: FxHashMap::default(),
        }
    }

    fn cell_of(&self, p: Point) -> (i64, i64) {
        (
            (p[0] / self.cell_size).floor() as i64,
            (p[1] / self.cell_size).floor() as i64,
        )
    }

    pub fn rebuild<I: IntoIterator<Item = Point>>(&mut self, points: I) {
        self.buckets.clear();
        for (idx, p) in points.into_iter().enumerate() {
            let cell = self.cell_of(p);
            self.buckets.entry(cell).or_default().push(idx);
        }
    }

    /// Candidate indices in the 3x3 block of cells around `p`. A
    /// broad-phase filter: callers must still do an exact distance check.
    pub fn candidates_near(&self, p: Point) -> Vec<usize> {
        let (cx, cy) = self.cell_of(p);
        let mut out = Vec::new();
        for dx in -1..=1 {
            for dy in -1..=1 {
                if let Some(bucket) = self.buckets.get(&(cx + dx, cy + dy)) {
                    out.extend_from_slice(bucket);
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snap_angle_index_covers_all_octants() {
        for i in 0..8u8 {
            let a = index_to_angle(i);
            assert_eq!(snap_angle_index(a), i, "octant {i} angle {a}");
        }
    }

    #[test]
    fn circular_distance_wraps() {
        assert_eq!(circular_distance(0, 7), 1);
        assert_eq!(circular_distance(0, 4), 4);
        assert_eq!(circular_distance(1, 6), 3);
    }

    #[test]
    fn sanitize_replaces_non_finite() {
        assert_eq!(sanitize_f64(f64::NAN), 0.0);
        assert_eq!(sanitize_f64(f64::INFINITY), 0.0);
        assert_eq!(sanitize_f64(f64::NEG_INFINITY), 0.0);
        assert_eq!(sanitize_f64(3.5), 3.5);
    }

    #[test]
    fn crossing_segments_detected() {
        assert!(segments_intersect([0.0, 0.0], [2.0, 2.0], [0.0, 2.0], [2.0, 0.0]));
        assert!(!segments_intersect(
            [0.0, 0.0],
            [1.0, 0.0],
            [0.0, 5.0],
            [1.0, 5.0]
        ));
    }

    #[test]
    fn point_rect_distance_zero_inside() {
        assert_eq!(point_rect_distance([1.0, 1.0], [0.0, 0.0], [2.0, 2.0]), 0.0);
        assert!((point_rect_distance([3.0, 1.0], [0.0, 0.0], [2.0, 2.0]) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn spatial_grid_finds_nearby_candidates() {
        let mut grid = SpatialGrid::new(10.0);
        let points = vec![[0.0, 0.0], [5.0, 5.0], [500.0, 500.0]];
        grid.rebuild(points.iter().copied());
        let candidates = grid.candidates_near([1.0, 1.0]);
        assert!(candidates.contains(&0));
        assert!(candidates.contains(&1));
        assert!(!candidates.contains(&2));
    }
}
