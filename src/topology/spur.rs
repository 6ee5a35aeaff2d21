//! Degree-3 junction geometric disambiguation (spec.md §4.9, "CORE
//! INNOVATION"). Topology alone can't tell a straight trunk with a branch
//! peeling off from a true Y-merge; this module decides from the waypoint
//! geometry.

use std::collections::HashMap;

use crate::model::{Edge, EdgeId, StationId};

pub enum SpurResolution {
    Resolved {
        pre_fork_edge_id: EdgeId,
        branch_edge_ids: [EdgeId; 2],
    },
    Ambiguous,
}

type Point = (f64, f64);

fn vec_sub(a: Point, b: Point) -> Point {
    (a.0 - b.0, a.1 - b.1)
}

fn angle_deg(v: Point) -> f64 {
    v.1.atan2(v.0).to_degrees()
}

/// Absolute angular difference in `[0, 180]` degrees between two vectors.
fn angle_between_deg(a: Point, b: Point) -> f64 {
    let mut diff = (angle_deg(a) - angle_deg(b)).abs();
    if diff > 180.0 {
        diff = 360.0 - diff;
    }
    diff
}

/// Outward tangent vector for `edge` at `node`: the direction of travel
/// leaving `node` into the edge's interior, corrected for waypoint arrays
/// stored in reverse of `from`/`to` (spec.md §4.9).
fn outward_tangent(
    edge: &Edge,
    node: &StationId,
    coords: &HashMap<&StationId, Point>,
) -> Option<Point> {
    let from_coord = *coords.get(&edge.from)?;
    let to_coord = *coords.get(&edge.to)?;
    let poly = edge.waypoint_polyline(from_coord, to_coord);
    if poly.len() < 2 {
        return None;
    }
    let len = poly.len();

    let dist = |p: Point, q: Point| ((p.0 - q.0).powi(2) + (p.1 - q.1).powi(2)).sqrt();
    let reversed = dist(poly[0], to_coord) < dist(poly[0], from_coord);

    let (at_idx, next_idx) = if node == &edge.from {
        if reversed {
            (len - 1, len - 2)
        } else {
            (0, 1)
        }
    } else if node == &edge.to {
        if reversed {
            (0, 1)
        } else {
            (len - 1, len - 2)
        }
    } else {
        return None;
    };

    Some(vec_sub(poly[next_idx], poly[at_idx]))
}

/// Resolve a degree-3 junction given its three incident edges and the
/// station coordinates needed for waypoint orientation.
pub fn resolve_junction(
    node: &StationId,
    incident_edges: &[&Edge],
    coords: &HashMap<&StationId, Point>,
) -> SpurResolution {
    debug_assert_eq!(incident_edges.len(), 3);
    let tangents: Vec<Option<Point>> = incident_edges
        .iter()
        .map(|e| outward_tangent(e, node, coords))
        .collect();

    if tangents.iter().any(|t| t.is_none()) {
        return SpurResolution::Ambiguous;
    }
    let t: Vec<Point> = tangents.into_iter().map(|t| t.unwrap()).collect();

    let pairs = [(0usize, 1usize), (0, 2), (1, 2)];
    let mut angles: Vec<(f64, (usize, usize))> = pairs
        .iter()
        .map(|&(i, j)| (angle_between_deg(t[i], t[j]), (i, j)))
        .collect();
    angles.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap());

    let top1 = angles[0];
    let top2 = angles[1];
    let bottom = angles[2];

    if top1.0 <= 115.0 || top2.0 <= 115.0 {
        return SpurResolution::Ambiguous;
    }
    // A perfectly (or near-) symmetric three-way junction (e.g. three edges
    // spaced ~120 degrees apart) gives all three pairwise angles the same
    // value, so there is no pair that stands out as "the straight-through
    // axis" -- the >115 check alone passes for this case, but the pre-fork
    // edge it would derive is an artifact of angle-sort tie-breaking, not a
    // real geometric distinction. Reject explicitly when the spread between
    // the largest and smallest pairwise angle is negligible.
    if top1.0 - bottom.0 < 2.0 {
        return SpurResolution::Ambiguous;
    }

    let set1 = [top1.1 .0, top1.1 .1];
    let set2 = [top2.1 .0, top2.1 .1];
    let pre_fork_idx = set1.iter().find(|i| set2.contains(i)).copied();
    let Some(pre_fork_idx) = pre_fork_idx else {
        return SpurResolution::Ambiguous;
    };

    let branch_indices: Vec<usize> = (0..3).filter(|i| *i != pre_fork_idx).collect();
    SpurResolution::Resolved {
        pre_fork_edge_id: incident_edges[pre_fork_idx].id.clone(),
        branch_edge_ids: [
            incident_edges[branch_indices[0]].id.clone(),
            incident_edges[branch_indices[1]].id.clone(),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn edge(id: &str, from: &str, to: &str, waypoints: Vec<(f64, f64)>) -> Edge {
        Edge {
            id: id.into(),
            from: from.into(),
            to: to.into(),
            waypoints: waypoints
                .into_iter()
                .map(|(lng, lat)| crate::model::Waypoint { lng, lat })
                .collect(),
            length_meters: 100.0,
            shared_by_line_ids: BTreeSet::from([String::from("l1")]),
        }
    }

    #[test]
    fn straight_through_with_perpendicular_branch_resolves() {
        // Junction at (0,0): pre-fork runs west-east (A from (-10,0) to
        // (0,0), C from (0,0) to (10,0)); branch B goes straight north.
        let a = edge("a", "w", "j", vec![(-10.0, 0.0), (0.0, 0.0)]);
        let b = edge("b", "j", "n", vec![(0.0, 0.0), (0.0, 10.0)]);
        let c = edge("c", "j", "e", vec![(0.0, 0.0), (10.0, 0.0)]);
        let mut coords = HashMap::new();
        let w = "w".to_string();
        let j = "j".to_string();
        let n = "n".to_string();
        let e = "e".to_string();
        coords.insert(&w, (-10.0, 0.0));
        coords.insert(&j, (0.0, 0.0));
        coords.insert(&n, (0.0, 10.0));
        coords.insert(&e, (10.0, 0.0));

        let incident = [&a, &b, &c];
        match resolve_junction(&j, &incident, &coords) {
            SpurResolution::Resolved { pre_fork_edge_id, .. } => {
                assert!(pre_fork_edge_id == "a" || pre_fork_edge_id == "c");
            }
            SpurResolution::Ambiguous => panic!("expected a resolved junction"),
        }
    }

    #[test]
    fn symmetric_y_is_ambiguous() {
        // Three edges spaced exactly 120 degrees apart (90/210/330): no
        // pairwise angle stands out as "the straight-through axis".
        let a = edge("a", "j", "p1", vec![(0.0, 0.0), (0.0, 10.0)]);
        let b = edge("b", "j", "p2", vec![(0.0, 0.0), (-8.660_254, -5.0)]);
        let c = edge("c", "j", "p3", vec![(0.0, 0.0), (8.660_254, -5.0)]);
        let mut coords = HashMap::new();
        let j = "j".to_string();
        let p1 = "p1".to_string();
        let p2 = "p2".to_string();
        let p3 = "p3".to_string();
        coords.insert(&j, (0.0, 0.0));
        coords.insert(&p1, (0.0, 10.0));
        coords.insert(&p2, (-8.660_254, -5.0));
        coords.insert(&p3, (8.660_254, -5.0));

        let incident = [&a, &b, &c];
        match resolve_junction(&j, &incident, &coords) {
            SpurResolution::Ambiguous => {}
            SpurResolution::Resolved { .. } => panic!("symmetric Y should be ambiguous"),
        }
    }
}
