//! BFS orientation of one connected component (spec.md §4.10).
//!
//! Each degree-1 node starts its own forward walk; edges are oriented the
//! instant they're traversed. A degree-3 junction is classified once, on
//! first arrival, using its own spur resolution: arriving via the pre-fork
//! edge splits (both branches oriented outward); arriving via a branch
//! merges (the pre-fork continues outward, and the *other* branch needs no
//! special handling here — it is oriented correctly when its own walk,
//! starting from its own source, reaches this same junction from the other
//! side).

use std::collections::{HashMap, HashSet, VecDeque};

use crate::model::{Edge, EdgeId, StationId};
use crate::topology::adjacency::Adjacency;
use crate::topology::spur::{self, SpurResolution};

#[derive(Debug, Clone)]
pub struct DirectedEdge {
    pub id: EdgeId,
    pub from: StationId,
    pub to: StationId,
}

fn neighbor_via(adjacency: &Adjacency, node: &StationId, edge_id: &EdgeId) -> Option<StationId> {
    adjacency
        .get(node)?
        .iter()
        .find(|(_, eid, _)| eid == edge_id)
        .map(|(nbr, _, _)| nbr.clone())
}

/// Orient one connected component. Returns `Ok(None)` when the component has
/// no degree-1 node (the caller should try the fallback pass / simple-loop
/// path instead); `Ok(Some(edges))` on success; `Err(reason)` when a
/// geometric or structural rejection occurs.
pub fn orient_component(
    adjacency: &Adjacency,
    component_nodes: &[StationId],
    edges_by_id: &HashMap<&EdgeId, &Edge>,
    coords: &HashMap<&StationId, (f64, f64)>,
) -> Result<Option<Vec<DirectedEdge>>, String> {
    let degree = |n: &StationId| adjacency.get(n).map(|v| v.len()).unwrap_or(0);

    let mut starts: Vec<StationId> = component_nodes
        .iter()
        .filter(|n| degree(n) == 1)
        .cloned()
        .collect();
    starts.sort();

    if starts.is_empty() {
        return Ok(None);
    }

    let mut oriented: HashMap<EdgeId, (StationId, StationId)> = HashMap::new();
    let mut visited_nodes: HashSet<StationId> = HashSet::new();
    let mut queue: VecDeque<(StationId, Option<EdgeId>)> =
        starts.into_iter().map(|s| (s, None)).collect();

    while let Some((node, via_edge)) = queue.pop_front() {
        if visited_nodes.contains(&node) {
            continue;
        }
        visited_nodes.insert(node.clone());

        let incident = adjacency.get(&node).cloned().unwrap_or_default();
        let deg = incident.len();

        match deg {
            0 => {}
            1 => {
                if via_edge.is_none() {
                    let (nbr, eid, _) = incident[0].clone();
                    oriented.insert(eid.clone(), (node.clone(), nbr.clone()));
                    if !visited_nodes.contains(&nbr) {
                        queue.push_back((nbr, Some(eid)));
                    }
                }
            }
            2 => {
                let Some(via) = via_edge.clone() else {
                    return Err(format!(
                        "pathological topology: degree-2 node {node} reached with no arrival edge"
                    ));
                };
                let Some((nbr, eid, _)) = incident.iter().find(|(_, eid, _)| eid != &via) else {
                    return Err(format!(
                        "pathological topology: degree-2 node {node} has no outgoing edge"
                    ));
                };
                oriented.insert(eid.clone(), (node.clone(), nbr.clone()));
                if !visited_nodes.contains(nbr) {
                    queue.push_back((nbr.clone(), Some(eid.clone())));
                }
            }
            3 => {
                let Some(via) = via_edge.clone() else {
                    return Err(format!(
                        "pathological topology: degree-3 node {node} reached with no arrival edge"
                    ));
                };
                let incident_edges: Vec<&Edge> = incident
                    .iter()
                    .filter_map(|(_, eid, _)| edges_by_id.get(eid).copied())
                    .collect();
                if incident_edges.len() != 3 {
                    return Err(format!(
                        "pathological topology: degree-3 node {node} has unresolvable edges"
                    ));
                }
                let resolution = spur::resolve_junction(&node, &incident_edges, coords);
                let (pre_fork, branches) = match resolution {
                    SpurResolution::Resolved {
                        pre_fork_edge_id,
                        branch_edge_ids,
                    } => (pre_fork_edge_id, branch_edge_ids),
                    SpurResolution::Ambiguous => {
                        return Err(format!(
                            "geometrically ambiguous degree-3 junction at {node}"
                        ));
                    }
                };

                if via == pre_fork {
                    // Split: both branches oriented outward.
                    for branch_edge in &branches {
                        let Some(nbr) = neighbor_via(adjacency, &node, branch_edge) else {
                            return Err(format!(
                                "pathological topology: branch edge {branch_edge} missing at {node}"
                            ));
                        };
                        oriented.insert(branch_edge.clone(), (node.clone(), nbr.clone()));
                        if !visited_nodes.contains(&nbr) {
                            queue.push_back((nbr, Some(branch_edge.clone())));
                        }
                    }
                } else if branches.contains(&via) {
                    // Merge: pre-fork continues outward; the other branch
                    // is handled by its own walk from its own source.
                    let Some(nbr) = neighbor_via(adjacency, &node, &pre_fork) else {
                        return Err(format!(
                            "pathological topology: pre-fork edge {pre_fork} missing at {node}"
                        ));
                    };
                    oriented.insert(pre_fork.clone(), (node.clone(), nbr.clone()));
                    if !visited_nodes.contains(&nbr) {
                        queue.push_back((nbr, Some(pre_fork)));
                    }
                } else {
                    return Err(format!(
                        "pathological topology: arrival edge at {node} matches neither pre-fork nor branch"
                    ));
                }
            }
            _ => {
                return Err(format!("pathological topology: degree >= 4 at {node}"));
            }
        }
    }

    let total_edges: HashSet<&EdgeId> = adjacency
        .values()
        .flat_map(|v| v.iter().map(|(_, eid, _)| eid))
        .collect();
    if oriented.len() != total_edges.len() {
        return Err("pathological topology: not all edges were oriented".to_string());
    }

    validate_orientation(&oriented)?;

    Ok(Some(
        oriented
            .into_iter()
            .map(|(id, (from, to))| DirectedEdge { id, from, to })
            .collect(),
    ))
}

/// Post-orientation validation: at most two sources, at most two sinks, no
/// node with in-degree or out-degree above 2 (spec.md §4.10, "Validation").
fn validate_orientation(oriented: &HashMap<EdgeId, (StationId, StationId)>) -> Result<(), String> {
    let mut out_degree: HashMap<&StationId, u32> = HashMap::new();
    let mut in_degree: HashMap<&StationId, u32> = HashMap::new();
    for (from, to) in oriented.values() {
        *out_degree.entry(from).or_insert(0) += 1;
        *in_degree.entry(to).or_insert(0) += 1;
    }

    let mut nodes: HashSet<&StationId> = HashSet::new();
    nodes.extend(out_degree.keys());
    nodes.extend(in_degree.keys());

    let mut sources = 0;
    let mut sinks = 0;
    for &n in &nodes {
        let out = out_degree.get(n).copied().unwrap_or(0);
        let inn = in_degree.get(n).copied().unwrap_or(0);
        if inn == 0 {
            sources += 1;
        }
        if out == 0 {
            sinks += 1;
        }
        if inn > 2 {
            return Err(format!("pathological topology: in-degree > 2 at {n}"));
        }
        if out > 2 {
            return Err(format!("pathological topology: out-degree > 2 at {n}"));
        }
    }
    if sources > 2 {
        return Err("pathological topology: more than two sources".to_string());
    }
    if sinks > 2 {
        return Err("pathological topology: more than two sinks".to_string());
    }
    Ok(())
}
