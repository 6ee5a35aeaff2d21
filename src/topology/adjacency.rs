//! Adjacency construction and connected-component splitting for one line
//! (spec.md §4.8).

use std::collections::HashMap;

use petgraph::graph::{NodeIndex, UnGraph};

use crate::model::{Edge, EdgeId, Line, StationId};

#[derive(Debug, Clone)]
pub struct LineEdge {
    pub id: EdgeId,
    pub from: StationId,
    pub to: StationId,
    pub weight: f64,
}

/// node id -> (neighbor id, edge id, weight).
pub type Adjacency = HashMap<StationId, Vec<(StationId, EdgeId, f64)>>;

/// Collect the edges this line actually shares, requiring both endpoints to
/// exist among `all_edges`' stations implicitly (callers pass only edges
/// already known to resolve).
pub fn line_edges(line: &Line, all_edges: &[Edge]) -> Vec<LineEdge> {
    let by_id: HashMap<&EdgeId, &Edge> = all_edges.iter().map(|e| (&e.id, e)).collect();
    line.edge_ids
        .iter()
        .filter_map(|eid| by_id.get(eid))
        .filter(|e| e.shared_by_line_ids.contains(&line.id))
        .map(|e| LineEdge {
            id: e.id.clone(),
            from: e.from.clone(),
            to: e.to.clone(),
            weight: e.length_meters.max(1.0),
        })
        .collect()
}

pub fn build_adjacency(edges: &[LineEdge]) -> Adjacency {
    let mut adjacency: Adjacency = HashMap::new();
    for e in edges {
        adjacency
            .entry(e.from.clone())
            .or_default()
            .push((e.to.clone(), e.id.clone(), e.weight));
        adjacency
            .entry(e.to.clone())
            .or_default()
            .push((e.from.clone(), e.id.clone(), e.weight));
    }
    adjacency
}

/// Split into connected components, returning each as the set of node ids
/// and edge ids belonging to it. Built on `petgraph::graph::UnGraph` +
/// `tarjan_scc`, which on an undirected graph enumerates connected
/// components directly.
pub fn connected_components(
    adjacency: &Adjacency,
) -> Vec<(Vec<StationId>, Vec<EdgeId>)> {
    let mut graph: UnGraph<StationId, EdgeId> = UnGraph::new_undirected();
    let mut index_of: HashMap<&StationId, NodeIndex> = HashMap::new();

    let mut nodes: Vec<&StationId> = adjacency.keys().collect();
    nodes.sort();
    for &n in &nodes {
        index_of.insert(n, graph.add_node(n.clone()));
    }
    for &n in &nodes {
        let from_idx = index_of[n];
        for (nbr, eid, _) in &adjacency[n] {
            let to_idx = index_of[nbr];
            if !graph.contains_edge(from_idx, to_idx) {
                graph.add_edge(from_idx, to_idx, eid.clone());
            }
        }
    }

    let mut components: Vec<(Vec<StationId>, Vec<EdgeId>)> = petgraph::algo::tarjan_scc(&graph)
        .into_iter()
        .map(|indices| {
            let mut comp_nodes: Vec<StationId> =
                indices.iter().map(|&i| graph[i].clone()).collect();
            comp_nodes.sort();
            let comp_node_set: std::collections::HashSet<&StationId> =
                comp_nodes.iter().collect();
            let mut comp_edges: std::collections::BTreeSet<EdgeId> = std::collections::BTreeSet::new();
            for n in &comp_nodes {
                for (nbr, eid, _) in &adjacency[n] {
                    if comp_node_set.contains(nbr) {
                        comp_edges.insert(eid.clone());
                    }
                }
            }
            (comp_nodes, comp_edges.into_iter().collect())
        })
        .collect();
    components.sort_by(|a, b| a.0.first().cmp(&b.0.first()));
    components
}

pub fn degree(adjacency: &Adjacency, node: &StationId) -> usize {
    adjacency.get(node).map(|v| v.len()).unwrap_or(0)
}

/// The degree-4+ pre-check from spec.md §4.8: find the first offending node
/// in a component, if any.
pub fn find_degree_ge_4(adjacency: &Adjacency, component_nodes: &[StationId]) -> Option<StationId> {
    component_nodes
        .iter()
        .find(|n| degree(adjacency, n) >= 4)
        .cloned()
}
