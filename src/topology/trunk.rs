//! Trunk walk and branch extraction (spec.md §4.11).

use std::collections::{HashMap, HashSet};

use crate::model::{
    BranchTopologyResult, EdgeId, Interval, MidHangingBranch, StationId, OPEN_LEFT, OPEN_RIGHT,
};
use crate::topology::orient::DirectedEdge;

type DirAdj = HashMap<StationId, Vec<(StationId, EdgeId)>>;

fn build_out_adjacency(oriented: &[DirectedEdge]) -> DirAdj {
    let mut adj: DirAdj = HashMap::new();
    for e in oriented {
        adj.entry(e.from.clone())
            .or_default()
            .push((e.to.clone(), e.id.clone()));
    }
    for v in adj.values_mut() {
        v.sort_by(|a, b| a.1.cmp(&b.1));
    }
    adj
}

fn build_in_adjacency(oriented: &[DirectedEdge]) -> DirAdj {
    let mut adj: DirAdj = HashMap::new();
    for e in oriented {
        adj.entry(e.to.clone())
            .or_default()
            .push((e.from.clone(), e.id.clone()));
    }
    for v in adj.values_mut() {
        v.sort_by(|a, b| a.1.cmp(&b.1));
    }
    adj
}

fn sources(nodes: &[StationId], in_adj: &DirAdj) -> Vec<StationId> {
    let mut s: Vec<StationId> = nodes
        .iter()
        .filter(|n| in_adj.get(*n).map(|v| v.is_empty()).unwrap_or(true))
        .cloned()
        .collect();
    s.sort();
    s
}

fn sinks(nodes: &[StationId], out_adj: &DirAdj) -> Vec<StationId> {
    let mut s: Vec<StationId> = nodes
        .iter()
        .filter(|n| out_adj.get(*n).map(|v| v.is_empty()).unwrap_or(true))
        .cloned()
        .collect();
    s.sort();
    s
}

fn walk_forward(
    out_adj: &DirAdj,
    start: &StationId,
    trunk_set: &HashSet<StationId>,
    stop_on_branching: bool,
) -> Result<(Vec<StationId>, Vec<EdgeId>, bool), String> {
    let mut station_path = vec![start.clone()];
    let mut edge_path = Vec::new();
    let mut current = start.clone();
    loop {
        if trunk_set.contains(&current) && station_path.len() > 1 {
            return Ok((station_path, edge_path, true));
        }
        let Some(out) = out_adj.get(&current) else {
            return Ok((station_path, edge_path, false));
        };
        if out.is_empty() {
            return Ok((station_path, edge_path, false));
        }
        if stop_on_branching && out.len() > 1 && !trunk_set.contains(&current) {
            return Err(format!(
                "pathological topology: branch passes through higher-degree node {current}"
            ));
        }
        let (next, eid) = out[0].clone();
        station_path.push(next.clone());
        edge_path.push(eid);
        current = next;
    }
}

fn walk_backward(
    in_adj: &DirAdj,
    start: &StationId,
    trunk_set: &HashSet<StationId>,
) -> Result<(Vec<StationId>, Vec<EdgeId>, bool), String> {
    let mut station_path = vec![start.clone()];
    let mut edge_path = Vec::new();
    let mut current = start.clone();
    loop {
        if trunk_set.contains(&current) && station_path.len() > 1 {
            station_path.reverse();
            edge_path.reverse();
            return Ok((station_path, edge_path, true));
        }
        let Some(inc) = in_adj.get(&current) else {
            station_path.reverse();
            edge_path.reverse();
            return Ok((station_path, edge_path, false));
        };
        if inc.is_empty() {
            station_path.reverse();
            edge_path.reverse();
            return Ok((station_path, edge_path, false));
        }
        let (prev, eid) = inc[0].clone();
        station_path.push(prev.clone());
        edge_path.push(eid);
        current = prev;
    }
}

/// Walk the whole component from its oriented edges into trunk, hanging
/// end-branches, and closed intervals/mid-hanging branches.
pub fn extract_topology(
    component_nodes: &[StationId],
    oriented: &[DirectedEdge],
) -> Result<BranchTopologyResult, String> {
    let out_adj = build_out_adjacency(oriented);
    let in_adj = build_in_adjacency(oriented);

    let srcs = sources(component_nodes, &in_adj);
    let snks = sinks(component_nodes, &out_adj);

    let Some(trunk_start) = srcs.first().cloned() else {
        return Err("pathological topology: no source to start the trunk walk".to_string());
    };

    let mut trunk_station_ids = vec![trunk_start.clone()];
    let mut trunk_edge_ids = Vec::new();
    let mut current = trunk_start.clone();
    loop {
        let Some(out) = out_adj.get(&current) else {
            break;
        };
        if out.is_empty() {
            break;
        }
        let (next, eid) = out[0].clone();
        trunk_station_ids.push(next.clone());
        trunk_edge_ids.push(eid);
        current = next;
    }

    if trunk_station_ids.len() < 2 {
        return Err("pathological topology: trunk shorter than two stations".to_string());
    }

    let trunk_end = trunk_station_ids.last().cloned().unwrap();
    let trunk_index: HashMap<StationId, i64> = trunk_station_ids
        .iter()
        .enumerate()
        .map(|(i, s)| (s.clone(), i as i64))
        .collect();
    let mut trunk_set: HashSet<StationId> = trunk_station_ids.iter().cloned().collect();

    let mut claimed_edges: HashSet<EdgeId> = trunk_edge_ids.iter().cloned().collect();
    let mut claimed_stations: HashSet<StationId> = trunk_set.clone();

    let mut left_open: Option<Interval> = None;
    let mut right_open: Option<Interval> = None;

    for extra_source in srcs.iter().filter(|s| **s != trunk_start) {
        let (stations, edges, reached) = walk_forward(&out_adj, extra_source, &trunk_set, false)?;
        if !reached {
            return Err(format!(
                "pathological topology: hanging branch from {extra_source} never rejoins the trunk"
            ));
        }
        let rejoin = stations.last().cloned().unwrap();
        let interior: Vec<StationId> = stations[..stations.len() - 1].to_vec();
        for s in &interior {
            if !claimed_stations.insert(s.clone()) {
                return Err(format!("pathological topology: station {s} claimed twice"));
            }
        }
        for e in &edges {
            if !claimed_edges.insert(e.clone()) {
                return Err(format!("pathological topology: edge {e} claimed twice"));
            }
        }
        left_open = Some(Interval {
            from_station_id: None,
            to_station_id: Some(rejoin.clone()),
            from_index: OPEN_LEFT,
            to_index: trunk_index[&rejoin],
            station_ids: interior,
            edge_ids: edges,
        });
    }

    for extra_sink in snks.iter().filter(|s| **s != trunk_end) {
        let (stations, edges, reached) = walk_backward(&in_adj, extra_sink, &trunk_set)?;
        if !reached {
            return Err(format!(
                "pathological topology: hanging branch to {extra_sink} never departs the trunk"
            ));
        }
        let fork = stations.first().cloned().unwrap();
        let interior: Vec<StationId> = stations[1..].to_vec();
        for s in &interior {
            if !claimed_stations.insert(s.clone()) {
                return Err(format!("pathological topology: station {s} claimed twice"));
            }
        }
        for e in &edges {
            if !claimed_edges.insert(e.clone()) {
                return Err(format!("pathological topology: edge {e} claimed twice"));
            }
        }
        right_open = Some(Interval {
            from_station_id: Some(fork.clone()),
            to_station_id: None,
            from_index: trunk_index[&fork],
            to_index: OPEN_RIGHT,
            station_ids: interior,
            edge_ids: edges,
        });
    }

    let mut intervals: Vec<Interval> = Vec::new();
    let mut mid_branches: Vec<MidHangingBranch> = Vec::new();

    for (i, trunk_node) in trunk_station_ids.iter().enumerate().take(trunk_station_ids.len() - 1) {
        let trunk_edge_used = &trunk_edge_ids[i];
        let Some(out) = out_adj.get(trunk_node) else {
            continue;
        };
        if out.len() < 2 {
            continue;
        }
        for (branch_first, branch_edge) in out.iter().filter(|(_, eid)| eid != trunk_edge_used) {
            if claimed_stations.contains(branch_first) || claimed_edges.contains(branch_edge) {
                return Err(format!(
                    "pathological topology: branch at {trunk_node} violates exclusivity"
                ));
            }
            let (stations, edges, reached) =
                walk_forward(&out_adj, branch_first, &trunk_set, true)?;
            for s in &stations {
                if claimed_stations.contains(s) && s != branch_first {
                    return Err(format!(
                        "pathological topology: station {s} claimed by another branch"
                    ));
                }
            }
            for e in &edges {
                if claimed_edges.contains(e) {
                    return Err(format!(
                        "pathological topology: edge {e} claimed by another branch"
                    ));
                }
            }

            if reached {
                let rejoin = stations.last().cloned().unwrap();
                let q = trunk_index[&rejoin];
                let p = i as i64;
                if q <= p {
                    return Err(format!(
                        "pathological topology: interval branch at {trunk_node} does not advance (p={p}, q={q})"
                    ));
                }
                let interior = stations[..stations.len() - 1].to_vec();
                for s in &interior {
                    claimed_stations.insert(s.clone());
                }
                for e in &edges {
                    claimed_edges.insert(e.clone());
                }
                intervals.push(Interval {
                    from_station_id: Some(trunk_node.clone()),
                    to_station_id: Some(rejoin),
                    from_index: p,
                    to_index: q,
                    station_ids: interior,
                    edge_ids: edges,
                });
            } else {
                for s in &stations {
                    claimed_stations.insert(s.clone());
                }
                for e in &edges {
                    claimed_edges.insert(e.clone());
                }
                mid_branches.push(MidHangingBranch {
                    attach_to_station_id: trunk_node.clone(),
                    station_ids: stations,
                    edge_ids: edges,
                });
            }
        }
    }

    if let Some(iv) = left_open.clone() {
        intervals.push(iv);
    }
    if let Some(iv) = right_open.clone() {
        intervals.push(iv);
    }
    intervals.sort_by_key(|iv| iv.from_index);

    for w in intervals.windows(2) {
        if w[0].to_index > w[1].from_index {
            return Err("pathological topology: overlapping interval branches".to_string());
        }
    }

    trunk_set.clear();

    Ok(BranchTopologyResult {
        valid: true,
        reason: None,
        is_loop: Some(false),
        trunk_station_ids,
        trunk_edge_ids,
        intervals,
        mid_branches,
    })
}

/// Spec.md §4.11, "Simple loop fast-path": if orientation found no source at
/// all, check whether every node has degree exactly 2 and edge count equals
/// node count; if so, walk the cycle and emit a loop result with no
/// branches.
pub fn simple_loop(
    component_nodes: &[StationId],
    adjacency: &crate::topology::adjacency::Adjacency,
) -> Option<BranchTopologyResult> {
    if component_nodes.is_empty() {
        return None;
    }
    let edge_count: usize = {
        let mut ids = HashSet::new();
        for n in component_nodes {
            if let Some(neighbors) = adjacency.get(n) {
                for (_, eid, _) in neighbors {
                    ids.insert(eid.clone());
                }
            }
        }
        ids.len()
    };
    if edge_count != component_nodes.len() {
        return None;
    }
    if component_nodes
        .iter()
        .any(|n| adjacency.get(n).map(|v| v.len()).unwrap_or(0) != 2)
    {
        return None;
    }

    let start = component_nodes.iter().min().cloned().unwrap();
    let mut trunk_station_ids = vec![start.clone()];
    let mut trunk_edge_ids = Vec::new();
    let mut visited_edges = HashSet::new();
    let mut prev: Option<StationId> = None;
    let mut current = start.clone();
    loop {
        let neighbors = adjacency.get(&current)?;
        let next = neighbors.iter().find(|(nbr, eid, _)| {
            !visited_edges.contains(eid) && Some(nbr) != prev.as_ref()
        });
        let Some((nbr, eid, _)) = next.or_else(|| {
            neighbors.iter().find(|(_, eid, _)| !visited_edges.contains(eid))
        }) else {
            break;
        };
        visited_edges.insert(eid.clone());
        trunk_edge_ids.push(eid.clone());
        prev = Some(current.clone());
        current = nbr.clone();
        if current == start {
            break;
        }
        trunk_station_ids.push(current.clone());
    }

    Some(BranchTopologyResult {
        valid: true,
        reason: None,
        is_loop: Some(true),
        trunk_station_ids,
        trunk_edge_ids,
        intervals: Vec::new(),
        mid_branches: Vec::new(),
    })
}
