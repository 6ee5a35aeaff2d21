//! Layout quality scoring (spec.md §4.7).
//!
//! Every component follows the same shape: accumulate a raw penalty over
//! edges/stations/labels, then sanitize through
//! `ScoreBreakdown::sanitized` so a stray division produces a zero
//! component rather than poisoning the total (spec.md §7's numeric-anomaly
//! policy, shared with `geo_kernel::sanitize_f64`).

use rustc_hash::FxHashMap;

use crate::geo_kernel::{self, Aabb, Point};
use crate::layout::direction_plan;
use crate::layout::seed::EdgeRecord;
use crate::model::{LayoutConfig, Line, ScoreBreakdown};

pub struct ScoringInput<'a> {
    pub positions: &'a [Point],
    pub anchors: &'a [Point],
    pub edges: &'a [EdgeRecord],
    pub adjacency: &'a [Vec<(usize, usize)>],
    pub edge_directions: &'a FxHashMap<usize, u8>,
    pub lines: &'a [Line],
    pub edge_index_of_id: &'a FxHashMap<String, usize>,
    pub label_boxes: &'a FxHashMap<String, Aabb>,
    pub config: &'a LayoutConfig,
}

/// Rebuild each line's maximal edge chains for the per-line direction
/// sequences needed by `bend_component` and `short_run_component` (spec.md
/// §4.7 measures both over "each line's assigned direction sequence", the
/// same chain structure `direction_plan` assigns directions over).
fn line_chains(input: &ScoringInput) -> Vec<Vec<usize>> {
    let mut chains = Vec::new();
    for line in input.lines {
        let line_edge_indices: Vec<usize> = line
            .edge_ids
            .iter()
            .filter_map(|id| input.edge_index_of_id.get(id).copied())
            .collect();
        if line_edge_indices.len() < 2 {
            continue;
        }
        let adjacency = direction_plan::line_local_adjacency(&line_edge_indices, input.edges);
        for chain in direction_plan::extract_chains(&adjacency) {
            chains.push(chain.edge_path);
        }
    }
    chains
}

pub fn score(input: &ScoringInput) -> ScoreBreakdown {
    ScoreBreakdown {
        angle: angle_component(input),
        length: length_component(input),
        overlap: overlap_component(input),
        crossing: crossing_component(input),
        bend: bend_component(input),
        short_run: short_run_component(input),
        geo_deviation: geo_deviation_component(input),
        label_overlap: label_overlap_component(input),
    }
    .sanitized()
}

fn angle_component(input: &ScoringInput) -> f64 {
    let mut total = 0.0;
    for (ei, e) in input.edges.iter().enumerate() {
        let d = geo_kernel::sub(input.positions[e.to], input.positions[e.from]);
        if geo_kernel::length(d) < 1e-9 {
            continue;
        }
        let angle = geo_kernel::angle_of(d[0], d[1]);
        let idx = input
            .edge_directions
            .get(&ei)
            .copied()
            .unwrap_or_else(|| geo_kernel::snap_angle_index(angle));
        total += geo_kernel::angle_deviation_deg(angle, idx);
    }
    total
}

fn length_component(input: &ScoringInput) -> f64 {
    let mut total = 0.0;
    for e in input.edges {
        let actual = geo_kernel::distance(input.positions[e.from], input.positions[e.to]);
        total += (actual - e.desired_length).abs();
    }
    total * 0.18
}

fn overlap_component(input: &ScoringInput) -> f64 {
    let min_d = input.config.min_station_distance;
    let n = input.positions.len();
    let mut total = 0.0;
    let adjacent = |i: usize, j: usize| input.adjacency[i].iter().any(|&(nb, _)| nb == j);
    for i in 0..n {
        for j in (i + 1)..n {
            if adjacent(i, j) {
                continue;
            }
            let d = geo_kernel::distance(input.positions[i], input.positions[j]);
            if d < min_d {
                total += (min_d - d) * 2.9;
            }
        }
    }
    total
}

fn crossing_component(input: &ScoringInput) -> f64 {
    let edges = input.edges;
    let mut count = 0.0;
    for i in 0..edges.len() {
        for j in (i + 1)..edges.len() {
            let a = &edges[i];
            let b = &edges[j];
            if a.from == b.from || a.from == b.to || a.to == b.from || a.to == b.to {
                continue;
            }
            let p1 = input.positions[a.from];
            let p2 = input.positions[a.to];
            let q1 = input.positions[b.from];
            let q2 = input.positions[b.to];
            if geo_kernel::Aabb::of_segment(p1, p2).overlaps(&geo_kernel::Aabb::of_segment(q1, q2))
                && geo_kernel::segments_intersect(p1, p2, q1, q2)
            {
                count += 1.0;
            }
        }
    }
    count * 70.0
}

/// Sum of the circular distance between consecutive edges' assigned
/// octilinear directions within each line's chain, weighted by
/// `lineBendScoreWeight` (spec.md §4.7, "Bend").
fn bend_component(input: &ScoringInput) -> f64 {
    let mut total = 0.0;
    for chain in line_chains(input) {
        for w in chain.windows(2) {
            let (Some(&d0), Some(&d1)) = (
                input.edge_directions.get(&w[0]),
                input.edge_directions.get(&w[1]),
            ) else {
                continue;
            };
            total += geo_kernel::circular_distance(d0, d1) as f64 * input.config.line_bend_score_weight;
        }
    }
    total
}

/// Penalize direction runs, per line chain, that are shorter than
/// `lineMinRunEdges` or shorter than `1.35 * minEdgeLength` in total length
/// (spec.md §4.7, "Short run").
fn short_run_component(input: &ScoringInput) -> f64 {
    let mut total = 0.0;
    let length_floor = 1.35 * input.config.min_edge_length;
    for chain in line_chains(input) {
        let dirs: Vec<(usize, u8)> = chain
            .iter()
            .filter_map(|&ei| input.edge_directions.get(&ei).map(|&d| (ei, d)))
            .collect();
        if dirs.is_empty() {
            continue;
        }
        let mut start = 0usize;
        while start < dirs.len() {
            let mut end = start + 1;
            while end < dirs.len() && dirs[end].1 == dirs[start].1 {
                end += 1;
            }
            let run_len = end - start;
            let run_length: f64 = dirs[start..end]
                .iter()
                .map(|&(ei, _)| input.edges[ei].desired_length)
                .sum();
            if (run_len as u32) < input.config.line_min_run_edges || run_length < length_floor {
                total += input.config.line_short_run_score_weight;
            }
            start = end;
        }
    }
    total
}

fn geo_deviation_component(input: &ScoringInput) -> f64 {
    let mut total = 0.0;
    for i in 0..input.positions.len() {
        total += geo_kernel::distance(input.positions[i], input.anchors[i]) * input.config.geo_weight;
    }
    total * 0.11
}

fn label_overlap_component(input: &ScoringInput) -> f64 {
    let boxes: Vec<&Aabb> = input.label_boxes.values().collect();
    let mut total = 0.0;
    for i in 0..boxes.len() {
        for j in (i + 1)..boxes.len() {
            total += boxes[i].overlap_area(boxes[j]);
        }
    }
    total * 0.045
}
