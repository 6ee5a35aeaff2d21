//! Line direction planning: chain extraction and the 8-state direction DP
//! (spec.md §4.5).
//!
//! A discrete per-edge optimization with unary + pairwise transition costs
//! over a small fixed state space (8 octilinear compass directions),
//! solved with a standard Viterbi recurrence.

use rustc_hash::FxHashMap;

use crate::geo_kernel::{self, Point};
use crate::layout::seed::EdgeRecord;
use crate::model::{Line, LayoutConfig};

const DIRS: usize = 8;

/// A maximal sequence of edges where every interior node has degree 2
/// within the line's own edge subgraph (spec.md §4.5).
#[derive(Debug, Clone)]
pub struct Chain {
    pub node_path: Vec<usize>,
    pub edge_path: Vec<usize>,
    pub is_cycle: bool,
}

/// node index -> (neighbor node index, edge-record index), restricted to
/// one line's own edges.
pub fn line_local_adjacency(
    line_edge_indices: &[usize],
    edges: &[EdgeRecord],
) -> FxHashMap<usize, Vec<(usize, usize)>> {
    let mut adjacency: FxHashMap<usize, Vec<(usize, usize)>> = FxHashMap::default();
    for &ei in line_edge_indices {
        let e = &edges[ei];
        adjacency.entry(e.from).or_default().push((e.to, ei));
        adjacency.entry(e.to).or_default().push((e.from, ei));
    }
    adjacency
}

/// Walk maximal chains over a line-local adjacency map.
pub fn extract_chains(adjacency: &FxHashMap<usize, Vec<(usize, usize)>>) -> Vec<Chain> {
    let mut visited_edges: std::collections::HashSet<usize> = std::collections::HashSet::new();
    let mut chains = Vec::new();

    let is_pass_through = |node: usize| adjacency.get(&node).map(|v| v.len() == 2).unwrap_or(false);

    // Start chains at every node that is NOT pass-through (degree != 2),
    // walking through pass-through interiors until hitting another
    // non-pass-through node or closing a cycle.
    let mut starts: Vec<usize> = adjacency
        .keys()
        .copied()
        .filter(|&n| !is_pass_through(n))
        .collect();
    starts.sort_unstable();

    for start in starts {
        for &(first_nbr, first_edge) in adjacency.get(&start).cloned().unwrap_or_default().iter() {
            if visited_edges.contains(&first_edge) {
                continue;
            }
            let mut node_path = vec![start];
            let mut edge_path = vec![first_edge];
            visited_edges.insert(first_edge);
            let mut prev = start;
            let mut cur = first_nbr;
            node_path.push(cur);

            while is_pass_through(cur) && cur != start {
                let neighbors = &adjacency[&cur];
                let next = neighbors.iter().find(|&&(n, e)| n != prev || e != *edge_path.last().unwrap());
                let Some(&(next_node, next_edge)) = next else {
                    break;
                };
                if visited_edges.contains(&next_edge) {
                    break;
                }
                visited_edges.insert(next_edge);
                node_path.push(next_node);
                edge_path.push(next_edge);
                prev = cur;
                cur = next_node;
            }

            if edge_path.len() >= 1 {
                chains.push(Chain {
                    is_cycle: node_path.first() == node_path.last() && node_path.len() > 1,
                    node_path,
                    edge_path,
                });
            }
        }
    }

    // Any remaining unvisited edges belong to pure-cycle components with no
    // non-pass-through node at all (every node has degree 2). Walk those
    // separately.
    let mut remaining: Vec<usize> = adjacency
        .keys()
        .copied()
        .filter(|n| is_pass_through(*n))
        .collect();
    remaining.sort_unstable();
    for start in remaining {
        let edges_at_start: Vec<usize> = adjacency[&start].iter().map(|&(_, e)| e).collect();
        if edges_at_start.iter().all(|e| visited_edges.contains(e)) {
            continue;
        }
        let mut node_path = vec![start];
        let mut edge_path = Vec::new();
        let mut prev = start;
        let (mut cur, first_edge) = adjacency[&start]
            .iter()
            .find(|&&(_, e)| !visited_edges.contains(&e))
            .copied()
            .unwrap();
        visited_edges.insert(first_edge);
        edge_path.push(first_edge);
        node_path.push(cur);
        loop {
            if cur == start {
                break;
            }
            let neighbors = &adjacency[&cur];
            let next = neighbors
                .iter()
                .find(|&&(n, e)| !(n == prev && e == *edge_path.last().unwrap()) && !visited_edges.contains(&e));
            let Some(&(next_node, next_edge)) = next else {
                break;
            };
            visited_edges.insert(next_edge);
            node_path.push(next_node);
            edge_path.push(next_edge);
            prev = cur;
            cur = next_node;
        }
        chains.push(Chain {
            is_cycle: true,
            node_path,
            edge_path,
        });
    }

    chains.retain(|c| c.edge_path.len() >= 2);
    chains
}

fn main_direction_index(chain: &Chain, positions: &[Point], edges: &[EdgeRecord]) -> u8 {
    let first = chain.node_path[0];
    let last = *chain.node_path.last().unwrap();
    if !chain.is_cycle && first != last {
        let d = geo_kernel::sub(positions[last], positions[first]);
        if geo_kernel::length(d) > 1e-9 {
            return geo_kernel::snap_angle_index(geo_kernel::angle_of(d[0], d[1]));
        }
    }
    // Cyclic or degenerate: length-weighted circular mean of edge angles.
    let mut sum_sin = 0.0;
    let mut sum_cos = 0.0;
    for &ei in &chain.edge_path {
        let e = &edges[ei];
        let d = geo_kernel::sub(positions[e.to], positions[e.from]);
        let len = geo_kernel::length(d).max(1e-9);
        let angle = geo_kernel::angle_of(d[0], d[1]);
        sum_sin += angle.sin() * len;
        sum_cos += angle.cos() * len;
    }
    geo_kernel::snap_angle_index(sum_sin.atan2(sum_cos))
}

fn unary_cost(
    observed_angle: f64,
    dir: u8,
    main: u8,
    config: &LayoutConfig,
) -> f64 {
    let observed_idx_angle_dev = geo_kernel::angle_deviation_deg(observed_angle, dir);
    observed_idx_angle_dev * config.line_data_angle_weight
        + (geo_kernel::circular_distance(dir, main) as f64) * config.line_main_direction_weight
}

fn transition_cost(prev: u8, next: u8, config: &LayoutConfig) -> f64 {
    if prev == next {
        return 0.0;
    }
    let steps = geo_kernel::circular_distance(prev, next);
    let mut cost = config.line_turn_penalty + (steps as f64) * config.line_turn_step_penalty;
    if steps == 4 {
        cost += config.line_u_turn_penalty;
    } else if steps == 3 {
        cost += 0.45 * config.line_u_turn_penalty;
    }
    cost
}

/// Solve the 8-state Viterbi DP for one chain's edges, returning the
/// optimal direction index per edge.
pub fn solve_chain_directions(
    chain: &Chain,
    positions: &[Point],
    edges: &[EdgeRecord],
    config: &LayoutConfig,
) -> Vec<u8> {
    let main = main_direction_index(chain, positions, edges);
    let n = chain.edge_path.len();
    let observed: Vec<f64> = chain
        .edge_path
        .iter()
        .map(|&ei| {
            let e = &edges[ei];
            let d = geo_kernel::sub(positions[e.to], positions[e.from]);
            geo_kernel::angle_of(d[0], d[1])
        })
        .collect();

    // dp[i][d] = min cost of assigning directions to edges 0..=i with edge i = d.
    let mut dp = vec![[f64::INFINITY; DIRS]; n];
    let mut back = vec![[0u8; DIRS]; n];

    for d in 0..DIRS {
        dp[0][d as usize] = unary_cost(observed[0], d as u8, main, config);
    }
    for i in 1..n {
        for d in 0..DIRS {
            let u = unary_cost(observed[i], d as u8, main, config);
            let mut best = f64::INFINITY;
            let mut best_prev = 0u8;
            for p in 0..DIRS {
                let cost = dp[i - 1][p] + transition_cost(p as u8, d as u8, config) + u;
                if cost < best {
                    best = cost;
                    best_prev = p as u8;
                }
            }
            dp[i][d] = best;
            back[i][d] = best_prev;
        }
    }

    let mut last_best = 0usize;
    for d in 1..DIRS {
        if dp[n - 1][d] < dp[n - 1][last_best] {
            last_best = d;
        }
    }
    let mut result = vec![0u8; n];
    result[n - 1] = last_best as u8;
    for i in (1..n).rev() {
        result[i - 1] = back[i][result[i] as usize];
    }
    result
}

/// Up to 4 passes: merge any maximal run of identical directions shorter
/// than `lineMinRunEdges` into a neighboring run or the chain's main
/// direction, minimizing the same unary+transition cost metric with
/// `lineShortRunPenalty` as a merge bonus (spec.md §4.5, "Short-run
/// smoothing").
pub fn smooth_short_runs(
    directions: &mut [u8],
    observed: &[f64],
    main: u8,
    config: &LayoutConfig,
) {
    for _pass in 0..4 {
        let runs = run_lengths(directions);
        let mut changed = false;
        let mut idx = 0usize;
        for (dir, len) in runs {
            if (len as u32) < config.line_min_run_edges {
                let candidates: Vec<u8> = {
                    let mut c = vec![main];
                    if idx > 0 {
                        c.push(directions[idx - 1]);
                    }
                    if idx + len < directions.len() {
                        c.push(directions[idx + len]);
                    }
                    c
                };
                let mut best_dir = dir;
                let mut best_cost = f64::INFINITY;
                for &cand in &candidates {
                    let mut cost = 0.0;
                    for k in idx..(idx + len) {
                        cost += unary_cost(observed[k], cand, main, config);
                    }
                    if cand != dir {
                        cost -= config.line_short_run_penalty;
                    }
                    if cost < best_cost {
                        best_cost = cost;
                        best_dir = cand;
                    }
                }
                if best_dir != dir {
                    for slot in directions.iter_mut().take(idx + len).skip(idx) {
                        *slot = best_dir;
                    }
                    changed = true;
                }
            }
            idx += len;
        }
        if !changed {
            break;
        }
    }
}

fn run_lengths(directions: &[u8]) -> Vec<(u8, usize)> {
    let mut runs = Vec::new();
    let mut i = 0;
    while i < directions.len() {
        let d = directions[i];
        let mut j = i + 1;
        while j < directions.len() && directions[j] == d {
            j += 1;
        }
        runs.push((d, j - i));
        i = j;
    }
    runs
}

/// Materialize a chain's target node positions from its assigned
/// directions, redistributing closure error linearly across the chain
/// (spec.md §4.5).
pub fn chain_target_positions(
    chain: &Chain,
    directions: &[u8],
    positions: &[Point],
    edges: &[EdgeRecord],
) -> Vec<Point> {
    let n = chain.node_path.len();
    let mut targets = vec![positions[chain.node_path[0]]; n];
    for i in 0..chain.edge_path.len() {
        let len = geo_kernel::distance(
            positions[edges[chain.edge_path[i]].from],
            positions[edges[chain.edge_path[i]].to],
        );
        let angle = geo_kernel::index_to_angle(directions[i]);
        let step = [angle.cos() * len, angle.sin() * len];
        targets[i + 1] = geo_kernel::add(targets[i], step);
    }

    let last_actual = if chain.is_cycle {
        targets[0]
    } else {
        positions[*chain.node_path.last().unwrap()]
    };
    let closure_error = geo_kernel::sub(last_actual, targets[n - 1]);
    let steps = (n - 1).max(1) as f64;
    for (i, t) in targets.iter_mut().enumerate() {
        let frac = i as f64 / steps;
        *t = geo_kernel::add(*t, geo_kernel::scale(closure_error, frac));
    }
    targets
}

/// Per-node blend weight toward the chain target: penalizes high-degree
/// and interchange nodes (spec.md §4.5).
pub fn node_blend_weight(degree: usize, is_interchange: bool) -> f64 {
    let base = if degree >= 4 {
        0.55
    } else if degree == 3 {
        0.7
    } else if degree == 2 {
        0.9
    } else {
        1.0
    };
    if is_interchange {
        base * 0.62
    } else {
        base
    }
}

/// Run the full line-direction-planning phase over every line, mutating
/// `positions` in place and returning the assigned octilinear direction
/// index for each edge-record index touched by at least one line.
pub fn plan_all_lines(
    positions: &mut [Point],
    lines: &[Line],
    edge_index_of_id: &FxHashMap<String, usize>,
    edges: &[EdgeRecord],
    degree: &[usize],
    interchange: &[bool],
    config: &LayoutConfig,
) -> FxHashMap<usize, u8> {
    let mut assigned: FxHashMap<usize, u8> = FxHashMap::default();

    for _pass in 0..config.line_direction_passes {
        for line in lines {
            let line_edge_indices: Vec<usize> = line
                .edge_ids
                .iter()
                .filter_map(|id| edge_index_of_id.get(id).copied())
                .collect();
            if line_edge_indices.len() < 2 {
                continue;
            }
            let adjacency = line_local_adjacency(&line_edge_indices, edges);
            let chains = extract_chains(&adjacency);

            for chain in &chains {
                let mut directions = solve_chain_directions(chain, positions, edges, config);
                let main = main_direction_index(chain, positions, edges);
                let observed: Vec<f64> = chain
                    .edge_path
                    .iter()
                    .map(|&ei| {
                        let e = &edges[ei];
                        let d = geo_kernel::sub(positions[e.to], positions[e.from]);
                        geo_kernel::angle_of(d[0], d[1])
                    })
                    .collect();
                smooth_short_runs(&mut directions, &observed, main, config);

                let targets = chain_target_positions(chain, &directions, positions, edges);
                for (i, &node) in chain.node_path.iter().enumerate() {
                    let weight = node_blend_weight(degree[node], interchange[node])
                        * config.line_direction_blend;
                    let blended = geo_kernel::add(
                        geo_kernel::scale(positions[node], 1.0 - weight),
                        geo_kernel::scale(targets[i], weight),
                    );
                    positions[node] = blended;
                }

                for (i, &ei) in chain.edge_path.iter().enumerate() {
                    assigned.insert(ei, directions[i]);
                }
            }
        }
    }

    assigned
}
