//! Geometric post-processing (spec.md §4.3) and the octilinear hard
//! constraint (spec.md §4.4).
//!
//! A fixed, config-driven number of passes applied in sequence with no
//! convergence proof, re-deriving neighbor geometry fresh each cycle rather
//! than caching it across passes.

use rustc_hash::FxHashMap;

use crate::geo_kernel::{self, Point, SpatialGrid};
use crate::layout::direction_plan;
use crate::layout::seed::EdgeRecord;
use crate::model::{Line, LayoutConfig};

/// Blend every edge toward its nearest octilinear direction by `ratio`
/// (spec.md §4.3, "Soft octilinear snap"). Two calls are made by the
/// orchestrator at ratios 0.18 and 0.24.
pub fn soft_octilinear_snap(positions: &mut [Point], edges: &[EdgeRecord], ratio: f64) {
    let mut deltas = vec![[0.0, 0.0]; positions.len()];
    let mut weight = vec![0.0; positions.len()];

    for e in edges {
        let from = positions[e.from];
        let to = positions[e.to];
        let delta = geo_kernel::sub(to, from);
        let len = geo_kernel::length(delta);
        if len < 1e-9 {
            continue;
        }
        let angle = geo_kernel::angle_of(delta[0], delta[1]);
        let idx = geo_kernel::snap_angle_index(angle);
        let snapped_angle = geo_kernel::index_to_angle(idx);
        let target = [snapped_angle.cos() * len, snapped_angle.sin() * len];
        let mid = geo_kernel::scale(geo_kernel::add(from, to), 0.5);
        let target_from = geo_kernel::sub(mid, geo_kernel::scale(target, 0.5));
        let target_to = geo_kernel::add(mid, geo_kernel::scale(target, 0.5));

        deltas[e.from] = geo_kernel::add(deltas[e.from], geo_kernel::sub(target_from, from));
        weight[e.from] += 1.0;
        deltas[e.to] = geo_kernel::add(deltas[e.to], geo_kernel::sub(target_to, to));
        weight[e.to] += 1.0;
    }

    for i in 0..positions.len() {
        if weight[i] > 0.0 {
            let avg = geo_kernel::scale(deltas[i], 1.0 / weight[i]);
            positions[i] = geo_kernel::add(positions[i], geo_kernel::scale(avg, ratio));
        }
    }
}

/// Exact octilinear projection (spec.md §4.4, "Exact phase"): for each edge
/// compute the error vector between its current and snapped-target
/// direction, then split that correction between the endpoints inversely
/// proportional to degree -- a degree-1 tip absorbs the whole correction,
/// otherwise each endpoint moves in proportion to the other's degree. Run
/// `config.octilinear_exact_passes` times.
pub fn exact_octilinear_pass(positions: &mut [Point], edges: &[EdgeRecord], degree: &[usize]) {
    for e in edges {
        let from = positions[e.from];
        let to = positions[e.to];
        let delta = geo_kernel::sub(to, from);
        let len = geo_kernel::length(delta);
        if len < 1e-9 {
            continue;
        }
        let angle = geo_kernel::angle_of(delta[0], delta[1]);
        let idx = geo_kernel::snap_angle_index(angle);
        let snapped_angle = geo_kernel::index_to_angle(idx);
        let target = [snapped_angle.cos() * len, snapped_angle.sin() * len];
        let error = geo_kernel::sub(target, delta);

        let from_is_tip = degree[e.from] <= 1;
        let to_is_tip = degree[e.to] <= 1;
        let (frac_from, frac_to) = if from_is_tip && to_is_tip {
            (0.5, 0.5)
        } else if from_is_tip {
            (1.0, 0.0)
        } else if to_is_tip {
            (0.0, 1.0)
        } else {
            let inv_from = 1.0 / degree[e.from] as f64;
            let inv_to = 1.0 / degree[e.to] as f64;
            let sum = inv_from + inv_to;
            (inv_from / sum, inv_to / sum)
        };

        positions[e.from] = geo_kernel::sub(positions[e.from], geo_kernel::scale(error, frac_from));
        positions[e.to] = geo_kernel::add(positions[e.to], geo_kernel::scale(error, frac_to));
    }
}

/// Relaxation phase of the octilinear hard constraint (spec.md §4.4): for
/// each edge, compute a target segment (current midpoint, snapped
/// direction, current length) and accumulate each endpoint's target
/// position weighted by `1/degree`. After processing all edges, blend
/// every node toward its accumulated target by
/// `octilinearBlend * degreePenalty * interchangePenalty` -- the same
/// degree/interchange-aware weight used for line-direction blending
/// (`direction_plan::node_blend_weight`), since both express "don't overcorrect
/// a high-degree or interchange node." Every 8 passes, re-run the soft snap.
fn relax_octilinear_phase(
    positions: &mut [Point],
    edges: &[EdgeRecord],
    degree: &[usize],
    interchange: &[bool],
    config: &LayoutConfig,
) {
    for pass in 0..config.octilinear_relax_iterations {
        let mut target_sum = vec![[0.0, 0.0]; positions.len()];
        let mut weight = vec![0.0; positions.len()];

        for e in edges {
            let from = positions[e.from];
            let to = positions[e.to];
            let delta = geo_kernel::sub(to, from);
            let len = geo_kernel::length(delta);
            if len < 1e-9 {
                continue;
            }
            let angle = geo_kernel::angle_of(delta[0], delta[1]);
            let idx = geo_kernel::snap_angle_index(angle);
            let snapped_angle = geo_kernel::index_to_angle(idx);
            let target = [snapped_angle.cos() * len, snapped_angle.sin() * len];
            let mid = geo_kernel::scale(geo_kernel::add(from, to), 0.5);
            let target_from = geo_kernel::sub(mid, geo_kernel::scale(target, 0.5));
            let target_to = geo_kernel::add(mid, geo_kernel::scale(target, 0.5));

            let w_from = 1.0 / degree[e.from].max(1) as f64;
            let w_to = 1.0 / degree[e.to].max(1) as f64;
            target_sum[e.from] = geo_kernel::add(target_sum[e.from], geo_kernel::scale(target_from, w_from));
            weight[e.from] += w_from;
            target_sum[e.to] = geo_kernel::add(target_sum[e.to], geo_kernel::scale(target_to, w_to));
            weight[e.to] += w_to;
        }

        for i in 0..positions.len() {
            if weight[i] <= 0.0 {
                continue;
            }
            let target = geo_kernel::scale(target_sum[i], 1.0 / weight[i]);
            let strength =
                config.octilinear_blend * direction_plan::node_blend_weight(degree[i], interchange[i]);
            positions[i] = geo_kernel::add(
                geo_kernel::scale(positions[i], 1.0 - strength),
                geo_kernel::scale(target, strength),
            );
        }

        if (pass + 1) % 8 == 0 {
            soft_octilinear_snap(positions, edges, 0.18);
        }
    }
}

/// Run the full two-phase octilinear hard constraint: the weighted
/// relaxation phase followed by `config.octilinear_exact_passes` exact
/// snap passes (spec.md §4.4).
pub fn relax_octilinear(
    positions: &mut [Point],
    edges: &[EdgeRecord],
    degree: &[usize],
    interchange: &[bool],
    config: &LayoutConfig,
) {
    relax_octilinear_phase(positions, edges, degree, interchange, config);
    for _ in 0..config.octilinear_exact_passes {
        exact_octilinear_pass(positions, edges, degree);
    }
}

/// Straighten degree-2, non-interchange pass-through stations that already
/// point within `straightenTurnToleranceDeg` of collinear with their two
/// line-neighbors, pulling them onto the straight line between those
/// neighbors at `straightenStrength` (spec.md §4.3, "Corridor
/// straightening").
pub fn corridor_straighten(
    positions: &mut [Point],
    lines: &[Line],
    edge_index_of_id: &FxHashMap<String, usize>,
    edges: &[EdgeRecord],
    interchange: &[bool],
    config: &LayoutConfig,
) {
    for line in lines {
        let line_edge_indices: Vec<usize> = line
            .edge_ids
            .iter()
            .filter_map(|id| edge_index_of_id.get(id).copied())
            .collect();
        if line_edge_indices.len() < 2 {
            continue;
        }
        let adjacency = direction_plan::line_local_adjacency(&line_edge_indices, edges);

        for (&node, neighbors) in &adjacency {
            if neighbors.len() != 2 || interchange[node] {
                continue;
            }
            let a = positions[neighbors[0].0];
            let b = positions[neighbors[1].0];
            let p = positions[node];
            let v1 = geo_kernel::sub(p, a);
            let v2 = geo_kernel::sub(b, p);
            if geo_kernel::length(v1) < 1e-9 || geo_kernel::length(v2) < 1e-9 {
                continue;
            }
            let angle1 = geo_kernel::angle_of(v1[0], v1[1]);
            let angle2 = geo_kernel::angle_of(v2[0], v2[1]);
            let mut diff = (angle2 - angle1).abs();
            if diff > std::f64::consts::PI {
                diff = std::f64::consts::TAU - diff;
            }
            if diff.to_degrees() > config.straighten_turn_tolerance_deg {
                continue;
            }
            let t = {
                let ab = geo_kernel::sub(b, a);
                let ap = geo_kernel::sub(p, a);
                let denom = geo_kernel::dot(ab, ab).max(1e-9);
                (geo_kernel::dot(ap, ab) / denom).clamp(0.0, 1.0)
            };
            let projected = geo_kernel::add(a, geo_kernel::scale(geo_kernel::sub(b, a), t));
            positions[node] = geo_kernel::add(
                geo_kernel::scale(p, 1.0 - config.straighten_strength),
                geo_kernel::scale(projected, config.straighten_strength),
            );
        }
    }
}

/// Pull overlong edges (more than 1.8x `maxEdgeLength`) toward their target
/// length by moving both endpoints symmetrically (spec.md §4.3, "Compact
/// long edges").
pub fn compact_long_edges(positions: &mut [Point], edges: &[EdgeRecord], config: &LayoutConfig) {
    for e in edges {
        let from = positions[e.from];
        let to = positions[e.to];
        let delta = geo_kernel::sub(to, from);
        let len = geo_kernel::length(delta);
        let threshold = 1.12 * config.max_edge_length;
        if len <= threshold || len < 1e-9 {
            continue;
        }
        let unit = geo_kernel::scale(delta, 1.0 / len);
        let excess = len - e.desired_length;
        let shift = geo_kernel::scale(unit, excess * 0.5 * 0.4);
        positions[e.from] = geo_kernel::add(positions[e.from], shift);
        positions[e.to] = geo_kernel::sub(positions[e.to], shift);
    }
}

/// One broad-phase-bounded proximity repel pass: any two non-adjacent
/// stations closer than `minStationDistance` are pushed directly apart
/// (spec.md §4.3, "Proximity repel"). Repeated `stationSpacingRefineCycles`
/// times by the caller.
pub fn proximity_repel(positions: &mut [Point], adjacency: &[Vec<(usize, usize)>], config: &LayoutConfig) {
    let mut grid = SpatialGrid::new(1.6 * config.min_station_distance);
    grid.rebuild(positions.iter().copied());

    let adjacent = |i: usize, j: usize| adjacency[i].iter().any(|&(n, _)| n == j);

    for i in 0..positions.len() {
        for j in grid.candidates_near(positions[i]) {
            if j <= i || adjacent(i, j) {
                continue;
            }
            let delta = geo_kernel::sub(positions[i], positions[j]);
            let d = geo_kernel::length(delta);
            if d >= config.min_station_distance || d < 1e-9 {
                continue;
            }
            let push_total = config.min_station_distance - d;
            let dir = geo_kernel::scale(delta, 1.0 / d);
            let half = geo_kernel::scale(dir, push_total * 0.5);
            positions[i] = geo_kernel::add(positions[i], half);
            positions[j] = geo_kernel::sub(positions[j], half);
        }
    }
}

/// Enforce a hard floor on edge length by moving endpoints apart along the
/// current edge direction (spec.md §4.3, "Minimum edge length
/// enforcement").
pub fn enforce_min_edge_length(positions: &mut [Point], edges: &[EdgeRecord], config: &LayoutConfig) {
    for e in edges {
        let from = positions[e.from];
        let to = positions[e.to];
        let delta = geo_kernel::sub(to, from);
        let len = geo_kernel::length(delta);
        if len >= config.min_edge_length || len < 1e-9 {
            continue;
        }
        let unit = geo_kernel::scale(delta, 1.0 / len);
        let deficit = config.min_edge_length - len;
        let half = geo_kernel::scale(unit, deficit * 0.5);
        positions[e.from] = geo_kernel::sub(positions[e.from], half);
        positions[e.to] = geo_kernel::add(positions[e.to], half);
    }
}

/// Direct-move variant of crossing repel used as a post-processing pass
/// rather than a relaxation force (spec.md §4.3, step 8's
/// `hardCrossingPasses`, distinct from `layout::force`'s
/// `crossing_repel_force`).
pub fn hard_crossing_pass(positions: &mut [Point], edges: &[EdgeRecord], config: &LayoutConfig) {
    for i in 0..edges.len() {
        for j in (i + 1)..edges.len() {
            let a = &edges[i];
            let b = &edges[j];
            if a.from == b.from || a.from == b.to || a.to == b.from || a.to == b.to {
                continue;
            }
            let p1 = positions[a.from];
            let p2 = positions[a.to];
            let q1 = positions[b.from];
            let q2 = positions[b.to];
            if !geo_kernel::Aabb::of_segment(p1, p2).overlaps(&geo_kernel::Aabb::of_segment(q1, q2))
            {
                continue;
            }
            if !geo_kernel::segments_intersect(p1, p2, q1, q2) {
                continue;
            }
            let mid_a = geo_kernel::scale(geo_kernel::add(p1, p2), 0.5);
            let mid_b = geo_kernel::scale(geo_kernel::add(q1, q2), 0.5);
            let delta = geo_kernel::sub(mid_a, mid_b);
            let d = geo_kernel::length(delta).max(1e-5);
            let push = geo_kernel::scale(delta, (config.crossing_repel_weight * 0.032) / d);

            positions[a.from] = geo_kernel::add(positions[a.from], push);
            positions[a.to] = geo_kernel::add(positions[a.to], push);
            positions[b.from] = geo_kernel::sub(positions[b.from], push);
            positions[b.to] = geo_kernel::sub(positions[b.to], push);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(from: usize, to: usize, desired_length: f64) -> EdgeRecord {
        EdgeRecord {
            id: format!("e{from}-{to}"),
            from,
            to,
            desired_length,
            line_ids: Default::default(),
        }
    }

    #[test]
    fn exact_snap_makes_edge_octilinear() {
        let mut positions = vec![[0.0, 0.0], [10.0, 3.0]];
        let edges = vec![edge(0, 1, 40.0)];
        exact_octilinear_pass(&mut positions, &edges, &[1, 1]);
        let d = geo_kernel::sub(positions[1], positions[0]);
        let angle = geo_kernel::angle_of(d[0], d[1]);
        let idx = geo_kernel::snap_angle_index(angle);
        assert_eq!(geo_kernel::snap_angle_index(geo_kernel::index_to_angle(idx)), idx);
    }

    #[test]
    fn min_edge_length_enforced() {
        let mut positions = vec![[0.0, 0.0], [5.0, 0.0]];
        let edges = vec![edge(0, 1, 60.0)];
        let config = LayoutConfig::default();
        enforce_min_edge_length(&mut positions, &edges, &config);
        let len = geo_kernel::distance(positions[0], positions[1]);
        assert!(len >= config.min_edge_length - 1e-9);
    }

    #[test]
    fn proximity_repel_separates_close_stations() {
        let mut positions = vec![[0.0, 0.0], [1.0, 0.0]];
        let adjacency = vec![vec![], vec![]];
        let config = LayoutConfig::default();
        proximity_repel(&mut positions, &adjacency, &config);
        let d = geo_kernel::distance(positions[0], positions[1]);
        assert!(d > 1.0);
    }
}
