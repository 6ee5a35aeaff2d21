//! Branch topology analysis: decompose one line's connected components into
//! a trunk plus hanging/interval branches (spec.md §4.8-4.11).

pub mod adjacency;
pub mod orient;
pub mod spur;
pub mod trunk;
pub mod xml;

use std::collections::HashMap;

use crate::model::{BranchTopologyResult, LineId, Project};

/// Analyze every connected component of `line_id` within `project`,
/// returning one `BranchTopologyResult` per component. A component that
/// fails for a structural or geometric reason is reported as an invalid
/// result rather than aborting the whole analysis (spec.md §7,
/// "TopologyUnsupported").
pub fn analyze_line(project: &Project, line_id: &LineId) -> Vec<BranchTopologyResult> {
    let Some(line) = project.lines.iter().find(|l| &l.id == line_id) else {
        return vec![BranchTopologyResult::invalid(format!(
            "unknown line id: {line_id}"
        ))];
    };

    let line_edges = adjacency::line_edges(line, &project.edges);
    if line_edges.is_empty() {
        return vec![BranchTopologyResult::invalid("line has no edges")];
    }

    let adjacency = adjacency::build_adjacency(&line_edges);
    let components = adjacency::connected_components(&adjacency);

    let edges_by_id: HashMap<&String, &crate::model::Edge> =
        project.edges.iter().map(|e| (&e.id, e)).collect();
    let coords: HashMap<&String, (f64, f64)> = project
        .stations
        .iter()
        .map(|s| (&s.id, (s.lng, s.lat)))
        .collect();

    components
        .into_iter()
        .map(|(nodes, _edge_ids)| analyze_component(&nodes, &adjacency, &edges_by_id, &coords))
        .collect()
}

fn analyze_component(
    nodes: &[String],
    adjacency: &adjacency::Adjacency,
    edges_by_id: &HashMap<&String, &crate::model::Edge>,
    coords: &HashMap<&String, (f64, f64)>,
) -> BranchTopologyResult {
    if let Some(bad) = adjacency::find_degree_ge_4(adjacency, nodes) {
        return BranchTopologyResult::invalid(format!("node {bad} has degree >= 4"));
    }

    // orient::orient_component needs a `HashMap<&EdgeId, &Edge>` restricted
    // to this component's own edges for spur resolution; the full map is a
    // safe superset since edge ids are globally unique.
    match orient::orient_component(adjacency, nodes, edges_by_id, coords) {
        Ok(Some(oriented)) => match trunk::extract_topology(nodes, &oriented) {
            Ok(result) => result,
            Err(reason) => BranchTopologyResult::invalid(reason),
        },
        Ok(None) => match trunk::simple_loop(nodes, adjacency) {
            Some(result) => result,
            None => BranchTopologyResult::invalid(
                "no source station and component is not a simple loop",
            ),
        },
        Err(reason) => BranchTopologyResult::invalid(reason),
    }
}
