//! Per-iteration force relaxation (spec.md §4.2).
//!
//! The cooling-schedule shape (`temperature *= cooling` each pass, fixed
//! iteration count, no convergence test) bounds pairwise work with a
//! spatial grid rather than an all-pairs scan, the same fixed-cycle
//! post-processing shape used for octilinear constraint projection.

use crate::geo_kernel::{self, Point, SpatialGrid};
use crate::layout::seed::EdgeRecord;
use crate::model::LayoutConfig;

pub struct ForceContext<'a> {
    pub anchors: &'a [Point],
    pub edges: &'a [EdgeRecord],
    pub adjacency: &'a [Vec<(usize, usize)>],
    pub config: &'a LayoutConfig,
}

/// Run `config.max_iterations` passes of force relaxation in place over
/// `positions`.
pub fn relax(positions: &mut [Point], ctx: &ForceContext) {
    let n = positions.len();
    if n == 0 {
        return;
    }
    let mut temperature = ctx.config.initial_temperature;
    let mut forces = vec![[0.0, 0.0]; n];
    let mut grid = SpatialGrid::new(1.6 * ctx.config.min_station_distance);

    for iteration in 0..ctx.config.max_iterations {
        for f in forces.iter_mut() {
            *f = [0.0, 0.0];
        }

        anchor_force(positions, ctx, &mut forces);
        spring_angle_force(positions, ctx, &mut forces);
        grid.rebuild(positions.iter().copied());
        repulsion_force(positions, ctx, &grid, &mut forces);
        junction_spread_force(positions, ctx, &mut forces);
        // Proximity repel is implemented as a dedicated post-processing pass
        // (layout::constraints::proximity_repel); spec.md §4.2 step 6 marks
        // it "optional per config" and §4.3 step 8 lists it again as a
        // standalone post-relaxation pass, so it is not duplicated here.
        if iteration % 14 == 0 {
            crossing_repel_force(positions, ctx, &mut forces);
        }

        for i in 0..n {
            positions[i][0] += forces[i][0] * 0.12 * temperature;
            positions[i][1] += forces[i][1] * 0.12 * temperature;
        }

        clamp_displacement(positions, ctx);

        temperature *= ctx.config.cooling;
    }
}

fn anchor_force(positions: &[Point], ctx: &ForceContext, forces: &mut [Point]) {
    for i in 0..positions.len() {
        let d = geo_kernel::sub(ctx.anchors[i], positions[i]);
        forces[i][0] += ctx.config.anchor_weight * d[0];
        forces[i][1] += ctx.config.anchor_weight * d[1];
    }
}

fn blended_target_angle(
    current_vec: Point,
    from_idx: usize,
    to_idx: usize,
    ctx: &ForceContext,
) -> f64 {
    let cur_angle = geo_kernel::angle_of(current_vec[0], current_vec[1]);
    let cur_snap_idx = geo_kernel::snap_angle_index(cur_angle);
    let cur_snap_angle = geo_kernel::index_to_angle(cur_snap_idx);

    let geo_vec = geo_kernel::sub(ctx.anchors[to_idx], ctx.anchors[from_idx]);
    let geo_angle = geo_kernel::angle_of(geo_vec[0], geo_vec[1]);
    let geo_snap_idx = geo_kernel::snap_angle_index(geo_angle);
    let geo_snap_angle = geo_kernel::index_to_angle(geo_snap_idx);

    circular_lerp(cur_snap_angle, geo_snap_angle, ctx.config.geo_angle_bias)
}

/// Shortest-arc linear interpolation between two angles.
fn circular_lerp(a: f64, b: f64, t: f64) -> f64 {
    let two_pi = std::f64::consts::TAU;
    let mut diff = (b - a) % two_pi;
    if diff > std::f64::consts::PI {
        diff -= two_pi;
    } else if diff < -std::f64::consts::PI {
        diff += two_pi;
    }
    a + diff * t
}

fn spring_angle_force(positions: &[Point], ctx: &ForceContext, forces: &mut [Point]) {
    for e in ctx.edges {
        let from = positions[e.from];
        let to = positions[e.to];
        let delta = geo_kernel::sub(to, from);
        let len = geo_kernel::length(delta).max(1e-6);
        let unit = geo_kernel::scale(delta, 1.0 / len);

        // Linear spring toward desired length.
        let spring_mag = ctx.config.spring_weight * (len - e.desired_length);
        let spring = geo_kernel::scale(unit, spring_mag);
        forces[e.from][0] += spring[0];
        forces[e.from][1] += spring[1];
        forces[e.to][0] -= spring[0];
        forces[e.to][1] -= spring[1];

        // Angle-corrective component (spec.md §4.2 step 3, explicit formula).
        let target_angle = blended_target_angle(delta, e.from, e.to, ctx);
        let target_vec = [target_angle.cos() * len, target_angle.sin() * len];
        let correction = [
            ctx.config.angle_weight * (target_vec[0] - delta[0]),
            ctx.config.angle_weight * (target_vec[1] - delta[1]),
        ];
        forces[e.from][0] -= correction[0];
        forces[e.from][1] -= correction[1];
        forces[e.to][0] += correction[0];
        forces[e.to][1] += correction[1];
    }
}

fn repulsion_force(
    positions: &[Point],
    ctx: &ForceContext,
    grid: &SpatialGrid,
    forces: &mut [Point],
) {
    let threshold = 2.5 * ctx.config.min_station_distance;
    for i in 0..positions.len() {
        for &j in &grid.candidates_near(positions[i]) {
            if j <= i {
                continue;
            }
            let delta = geo_kernel::sub(positions[i], positions[j]);
            let d = geo_kernel::length(delta).max(1e-5);
            if d >= threshold {
                continue;
            }
            let magnitude = ctx.config.repulsion_weight / (d * d) * 0.023;
            let dir = geo_kernel::scale(delta, magnitude / d);
            forces[i][0] += dir[0];
            forces[i][1] += dir[1];
            forces[j][0] -= dir[0];
            forces[j][1] -= dir[1];
        }
    }
}

fn junction_spread_force(positions: &[Point], ctx: &ForceContext, forces: &mut [Point]) {
    const GAP_THRESHOLD: f64 = std::f64::consts::PI / 4.4;

    for (node, neighbors) in ctx.adjacency.iter().enumerate() {
        if neighbors.len() < 3 {
            continue;
        }
        let mut dirs: Vec<(f64, usize)> = neighbors
            .iter()
            .map(|&(nbr, _)| {
                let d = geo_kernel::sub(positions[nbr], positions[node]);
                (geo_kernel::angle_of(d[0], d[1]), nbr)
            })
            .collect();
        dirs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());

        let degree_scale = if neighbors.len() >= 4 { 1.4 } else { 1.0 };

        let count = dirs.len();
        for k in 0..count {
            let (angle_a, nbr_a) = dirs[k];
            let (angle_b, nbr_b) = dirs[(k + 1) % count];
            let mut gap = angle_b - angle_a;
            if gap < 0.0 {
                gap += std::f64::consts::TAU;
            }
            if gap >= GAP_THRESHOLD {
                continue;
            }
            let overlap = GAP_THRESHOLD - gap;
            let magnitude = overlap * 0.38 * ctx.config.junction_spread_weight * degree_scale;

            let bisector = circular_lerp(angle_a, angle_b, 0.5);
            let perp = bisector + std::f64::consts::FRAC_PI_2;
            let push = [perp.cos() * magnitude, perp.sin() * magnitude];

            forces[nbr_a][0] += push[0];
            forces[nbr_a][1] += push[1];
            forces[nbr_b][0] -= push[0];
            forces[nbr_b][1] -= push[1];
        }
    }
}

fn crossing_repel_force(positions: &[Point], ctx: &ForceContext, forces: &mut [Point]) {
    let edges = ctx.edges;
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
            let push = geo_kernel::scale(delta, (ctx.config.crossing_repel_weight * 0.032) / d);

            for idx in [a.from, a.to] {
                forces[idx][0] += push[0];
                forces[idx][1] += push[1];
            }
            for idx in [b.from, b.to] {
                forces[idx][0] -= push[0];
                forces[idx][1] -= push[1];
            }
        }
    }
}

pub fn clamp_displacement(positions: &mut [Point], ctx: &ForceContext) {
    for i in 0..positions.len() {
        let delta = geo_kernel::sub(positions[i], ctx.anchors[i]);
        let d = geo_kernel::length(delta);
        if d > ctx.config.displacement_limit && d > 1e-9 {
            let scale = ctx.config.displacement_limit / d;
            positions[i] = geo_kernel::add(ctx.anchors[i], geo_kernel::scale(delta, scale));
        }
    }
}
