//! Branch-topology analyzer scenarios (spec.md §8, S3-S6).

use octoschema::model::{
    Edge, Line, LineStatus, LineStyle, LocalizedName, Project, ProjectMeta, Station,
};
use octoschema::topology;

fn station(id: &str, lng: f64, lat: f64) -> Station {
    Station {
        id: id.to_string(),
        name: LocalizedName::default(),
        lng,
        lat,
        line_ids: Default::default(),
        display_pos: None,
    }
}

fn edge(id: &str, from: &str, to: &str, line: &str) -> Edge {
    Edge {
        id: id.to_string(),
        from: from.to_string(),
        to: to.to_string(),
        waypoints: vec![],
        length_meters: 0.0,
        shared_by_line_ids: [line.to_string()].into_iter().collect(),
    }
}

fn project(stations: Vec<Station>, edges: Vec<Edge>, line: Line) -> Project {
    Project {
        project_version: "1.0.0".to_string(),
        id: "p".to_string(),
        name: "Test Project".to_string(),
        region: None,
        region_boundary: None,
        stations,
        edges,
        lines: vec![line],
        layout_config: Default::default(),
        layout_meta: Default::default(),
        timeline_events: None,
        meta: ProjectMeta::default(),
    }
}

fn line(id: &str, edge_ids: &[&str], is_loop: bool) -> Line {
    Line {
        id: id.to_string(),
        name: LocalizedName::default(),
        color: "#000000".to_string(),
        status: LineStatus::Open,
        style: LineStyle::Solid,
        is_loop,
        edge_ids: edge_ids.iter().map(|s| s.to_string()).collect(),
    }
}

/// S3: a simple 4-station ring, marked `isLoop`.
#[test]
fn s3_simple_ring_is_a_loop() {
    let p = project(
        vec![
            station("A", 0.0, 0.0),
            station("B", 1.0, 0.0),
            station("C", 1.0, 1.0),
            station("D", 0.0, 1.0),
        ],
        vec![
            edge("e1", "A", "B", "L1"),
            edge("e2", "B", "C", "L1"),
            edge("e3", "C", "D", "L1"),
            edge("e4", "D", "A", "L1"),
        ],
        line("L1", &["e1", "e2", "e3", "e4"], true),
    );

    let results = topology::analyze_line(&p, &"L1".to_string());
    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert!(result.valid, "expected valid result: {:?}", result.reason);
    assert_eq!(result.is_loop, Some(true));
    assert_eq!(result.trunk_station_ids.len(), 4);
    assert!(result.intervals.is_empty());
}

/// S4: a Y-fork at a middle trunk node. Trunk runs A-B-C-{D or E}; whichever
/// of D/E doesn't continue the trunk is a dead-end mid-hanging branch off C
/// (spec.md §4.11: a fork point whose branch walk hits a dead end, rather
/// than rejoining the trunk, is recorded as a `MidHangingBranch`).
#[test]
fn s4_y_fork_at_middle_node_resolves_to_a_mid_hanging_branch() {
    let p = project(
        vec![
            station("A", 0.0, 0.0),
            station("B", 1.0, 0.0),
            station("C", 2.0, 0.0),
            // D branches off the B-C-E straight axis at 60 degrees.
            station("D", 2.5, 0.866_025_4),
            station("E", 3.0, 0.0),
        ],
        vec![
            edge("e1", "A", "B", "L1"),
            edge("e2", "B", "C", "L1"),
            edge("e3", "C", "D", "L1"),
            edge("e4", "C", "E", "L1"),
        ],
        line("L1", &["e1", "e2", "e3", "e4"], false),
    );

    let results = topology::analyze_line(&p, &"L1".to_string());
    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert!(result.valid, "expected valid result: {:?}", result.reason);
    assert_eq!(result.trunk_station_ids[..3], ["A".to_string(), "B".to_string(), "C".to_string()]);
    assert!(result.intervals.is_empty());
    assert_eq!(result.mid_branches.len(), 1);
    let branch = &result.mid_branches[0];
    assert_eq!(branch.attach_to_station_id, "C");
    assert_eq!(branch.station_ids.len(), 1);
    assert!(branch.station_ids[0] == "D" || branch.station_ids[0] == "E");
    assert_ne!(
        branch.station_ids[0],
        *result.trunk_station_ids.last().unwrap()
    );
}

/// S5: a symmetric 120-degree Y is geometrically ambiguous and rejected.
#[test]
fn s5_symmetric_y_is_rejected_as_ambiguous() {
    let angle = |deg: f64| deg.to_radians();
    let r = 1.0;
    let center = (0.0, 0.0);
    let p1 = (
        center.0 + r * angle(90.0).cos(),
        center.1 + r * angle(90.0).sin(),
    );
    let p2 = (
        center.0 + r * angle(210.0).cos(),
        center.1 + r * angle(210.0).sin(),
    );
    let p3 = (
        center.0 + r * angle(330.0).cos(),
        center.1 + r * angle(330.0).sin(),
    );

    let p = project(
        vec![
            station("center", center.0, center.1),
            station("p1", p1.0, p1.1),
            station("p2", p2.0, p2.1),
            station("p3", p3.0, p3.1),
        ],
        vec![
            edge("e1", "center", "p1", "L1"),
            edge("e2", "center", "p2", "L1"),
            edge("e3", "center", "p3", "L1"),
        ],
        line("L1", &["e1", "e2", "e3"], false),
    );

    let results = topology::analyze_line(&p, &"L1".to_string());
    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert!(!result.valid);
    assert!(result
        .reason
        .as_deref()
        .unwrap_or("")
        .to_lowercase()
        .contains("ambig"));
}

/// S6: an interval bypass (B-F-D) rejoining the trunk cleanly.
#[test]
fn s6_interval_bypass_is_a_closed_interval() {
    let p = project(
        vec![
            station("A", 0.0, 0.0),
            station("B", 1.0, 0.0),
            station("C", 2.0, 0.0),
            station("D", 3.0, 0.0),
            station("E", 4.0, 0.0),
            station("F", 2.0, 1.0),
        ],
        vec![
            edge("e1", "A", "B", "L1"),
            edge("e2", "B", "C", "L1"),
            edge("e3", "C", "D", "L1"),
            edge("e4", "D", "E", "L1"),
            edge("e5", "B", "F", "L1"),
            edge("e6", "F", "D", "L1"),
        ],
        line("L1", &["e1", "e2", "e3", "e4", "e5", "e6"], false),
    );

    let results = topology::analyze_line(&p, &"L1".to_string());
    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert!(result.valid, "expected valid result: {:?}", result.reason);
    assert_eq!(result.trunk_station_ids, vec!["A", "B", "C", "D", "E"]);
    assert_eq!(result.intervals.len(), 1);
    let interval = &result.intervals[0];
    assert!(!interval.is_left_open() && !interval.is_right_open());
    assert_eq!(interval.station_ids, vec!["F".to_string()]);
}

/// Topology coverage: trunk + intervals + mid-branches exactly cover the
/// line's edge set (spec.md §8, property 8).
#[test]
fn topology_coverage_matches_line_edge_set() {
    let p = project(
        vec![
            station("A", 0.0, 0.0),
            station("B", 1.0, 0.0),
            station("C", 2.0, 0.0),
            station("D", 3.0, 0.0),
            station("E", 4.0, 0.0),
            station("F", 2.0, 1.0),
        ],
        vec![
            edge("e1", "A", "B", "L1"),
            edge("e2", "B", "C", "L1"),
            edge("e3", "C", "D", "L1"),
            edge("e4", "D", "E", "L1"),
            edge("e5", "B", "F", "L1"),
            edge("e6", "F", "D", "L1"),
        ],
        line("L1", &["e1", "e2", "e3", "e4", "e5", "e6"], false),
    );

    let results = topology::analyze_line(&p, &"L1".to_string());
    let mut covered: std::collections::BTreeSet<String> = Default::default();
    for r in &results {
        covered.extend(r.covered_edge_ids());
    }
    let expected: std::collections::BTreeSet<String> =
        ["e1", "e2", "e3", "e4", "e5", "e6"].iter().map(|s| s.to_string()).collect();
    assert_eq!(covered, expected);
}

/// An unknown line id is reported as a single invalid component rather than
/// panicking.
#[test]
fn unknown_line_id_is_reported_invalid() {
    let p = project(vec![], vec![], line("L1", &[], false));
    let results = topology::analyze_line(&p, &"nope".to_string());
    assert_eq!(results.len(), 1);
    assert!(!results[0].valid);
}

/// XML export round-trips the essential structure (spec.md §8, property 10,
/// attribute-order insensitive -- checked here by substring presence).
#[test]
fn xml_export_contains_trunk_and_loop_markers() {
    let p = project(
        vec![
            station("A", 0.0, 0.0),
            station("B", 1.0, 0.0),
            station("C", 1.0, 1.0),
            station("D", 0.0, 1.0),
        ],
        vec![
            edge("e1", "A", "B", "L1"),
            edge("e2", "B", "C", "L1"),
            edge("e3", "C", "D", "L1"),
            edge("e4", "D", "A", "L1"),
        ],
        line("L1", &["e1", "e2", "e3", "e4"], true),
    );

    let results = topology::analyze_line(&p, &"L1".to_string());
    let line = p.lines.iter().find(|l| l.id == "L1").unwrap();
    let xml = topology::xml::render_line(line, &results);
    assert!(xml.starts_with("<?xml"));
    assert!(xml.contains("<Loop>"));
    assert!(xml.contains("<Station id=\"A\""));
}
