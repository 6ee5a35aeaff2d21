//! End-to-end optimizer scenarios (spec.md §8).

use std::collections::BTreeSet;

use octoschema::layout;
use octoschema::model::{
    Edge, Line, LineStatus, LineStyle, LocalizedName, OptimizeRequest, Station,
};

fn station(id: &str, lng: f64, lat: f64, line_ids: &[&str]) -> Station {
    Station {
        id: id.to_string(),
        name: LocalizedName {
            primary: id.to_string(),
            secondary: id.to_string(),
        },
        lng,
        lat,
        line_ids: line_ids.iter().map(|s| s.to_string()).collect(),
        display_pos: None,
    }
}

fn edge(id: &str, from: &str, to: &str, lines: &[&str]) -> Edge {
    Edge {
        id: id.to_string(),
        from: from.to_string(),
        to: to.to_string(),
        waypoints: vec![],
        length_meters: 0.0,
        shared_by_line_ids: lines.iter().map(|s| s.to_string()).collect(),
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

fn request(
    id: &str,
    stations: Vec<Station>,
    edges: Vec<Edge>,
    lines: Vec<Line>,
) -> OptimizeRequest {
    OptimizeRequest {
        stations,
        edges,
        lines,
        config: octoschema::model::LayoutConfig::default(),
        request_id: id.to_string(),
    }
}

/// S1: two stations, one edge, one straight line.
#[test]
fn s1_two_station_straight_line() {
    let req = request(
        "s1",
        vec![
            station("A", 0.0, 0.0, &["L1"]),
            station("B", 1.0, 0.0, &["L1"]),
        ],
        vec![edge("e1", "A", "B", &["L1"])],
        vec![line("L1", &["e1"], false)],
    );

    let resp = layout::optimize(&req);
    assert!(resp.ok, "expected success: {:?}", resp.error);
    let stations = resp.stations.expect("stations present");
    assert_eq!(stations.len(), 2);
    let breakdown = resp.breakdown.expect("breakdown present");
    assert!(breakdown.label_overlap >= 0.0);
    assert!(resp.score.unwrap().is_finite());

    let layout_meta = resp.layout_meta.expect("layout meta present");
    assert_eq!(layout_meta.edge_directions.len(), 1);
}

/// S2: three-station L-bend produces a nonzero bend penalty.
#[test]
fn s2_three_station_l_bend() {
    let req = request(
        "s2",
        vec![
            station("A", 0.0, 0.0, &["L1"]),
            station("B", 1.0, 0.0, &["L1"]),
            station("C", 1.0, 1.0, &["L1"]),
        ],
        vec![
            edge("e1", "A", "B", &["L1"]),
            edge("e2", "B", "C", &["L1"]),
        ],
        vec![line("L1", &["e1", "e2"], false)],
    );

    let resp = layout::optimize(&req);
    assert!(resp.ok, "expected success: {:?}", resp.error);
    let breakdown = resp.breakdown.unwrap();
    assert!(breakdown.bend >= 0.0);
}

/// Property 2: every output edge is octilinear within strict tolerance.
#[test]
fn octilinearity_holds_on_output() {
    let req = request(
        "octilinearity",
        vec![
            station("A", 0.0, 0.0, &["L1"]),
            station("B", 1.0, 0.3, &["L1"]),
            station("C", 2.0, -0.2, &["L1"]),
            station("D", 2.5, 1.1, &["L1"]),
        ],
        vec![
            edge("e1", "A", "B", &["L1"]),
            edge("e2", "B", "C", &["L1"]),
            edge("e3", "C", "D", &["L1"]),
        ],
        vec![line("L1", &["e1", "e2", "e3"], false)],
    );

    let resp = layout::optimize(&req);
    assert!(resp.ok, "expected success: {:?}", resp.error);
    let stations = resp.stations.unwrap();
    let pos = |id: &str| {
        stations
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.display_pos)
            .unwrap()
    };

    for (from, to) in [("A", "B"), ("B", "C"), ("C", "D")] {
        let p = pos(from);
        let q = pos(to);
        let dx = q[0] - p[0];
        let dy = q[1] - p[1];
        let angle = dy.atan2(dx);
        let nearest_octant = (angle / (std::f64::consts::PI / 4.0)).round() * (std::f64::consts::PI / 4.0);
        let deviation = (angle - nearest_octant).abs();
        assert!(
            deviation <= 0.01,
            "edge {from}-{to} not octilinear: deviation {deviation}"
        );
    }
}

/// Property 3/4: output respects minimum station spacing and edge length.
#[test]
fn minimum_spacing_and_edge_length_hold() {
    let req = request(
        "spacing",
        vec![
            station("A", 0.0, 0.0, &["L1"]),
            station("B", 0.0001, 0.0, &["L1"]),
            station("C", 0.0002, 0.0, &["L1"]),
        ],
        vec![
            edge("e1", "A", "B", &["L1"]),
            edge("e2", "B", "C", &["L1"]),
        ],
        vec![line("L1", &["e1", "e2"], false)],
    );

    let resp = layout::optimize(&req);
    assert!(resp.ok, "expected success: {:?}", resp.error);
    let stations = resp.stations.unwrap();
    let min_dist = req.config.min_station_distance;
    let min_edge = req.config.min_edge_length;

    for i in 0..stations.len() {
        for j in (i + 1)..stations.len() {
            let d = octoschema::geo_kernel::distance(stations[i].display_pos, stations[j].display_pos);
            assert!(d >= min_dist - 1e-3, "stations {i},{j} too close: {d}");
        }
    }
    for (from, to) in [("A", "B"), ("B", "C")] {
        let p = stations.iter().find(|s| s.id == from).unwrap().display_pos;
        let q = stations.iter().find(|s| s.id == to).unwrap().display_pos;
        let d = octoschema::geo_kernel::distance(p, q);
        assert!(d >= min_edge - 1e-3, "edge {from}-{to} too short: {d}");
    }
}

/// Property 5: score components are all finite and non-negative, and the
/// total equals their sum.
#[test]
fn score_components_are_finite_and_sum_correctly() {
    let req = request(
        "scoring",
        vec![
            station("A", 0.0, 0.0, &["L1"]),
            station("B", 1.0, 0.0, &["L1"]),
            station("C", 1.0, 1.0, &["L1"]),
        ],
        vec![
            edge("e1", "A", "B", &["L1"]),
            edge("e2", "B", "C", &["L1"]),
        ],
        vec![line("L1", &["e1", "e2"], false)],
    );

    let resp = layout::optimize(&req);
    assert!(resp.ok);
    let breakdown = resp.breakdown.unwrap();
    for component in [
        breakdown.angle,
        breakdown.length,
        breakdown.overlap,
        breakdown.crossing,
        breakdown.bend,
        breakdown.short_run,
        breakdown.geo_deviation,
        breakdown.label_overlap,
    ] {
        assert!(component.is_finite());
        assert!(component >= 0.0);
    }
    assert!((breakdown.total() - resp.score.unwrap()).abs() < 1e-9);
}

/// Degenerate input (empty stations) is a successful zero-score response,
/// not an error (spec.md §7).
#[test]
fn empty_stations_yields_zero_score_success() {
    let req = request("empty", vec![], vec![], vec![]);
    let resp = layout::optimize(&req);
    assert!(resp.ok);
    assert_eq!(resp.score, Some(0.0));
}

/// Invalid input (duplicate station id) is rejected at validation.
#[test]
fn duplicate_station_id_fails_validation() {
    let req = request(
        "dup",
        vec![station("A", 0.0, 0.0, &["L1"]), station("A", 1.0, 1.0, &["L1"])],
        vec![],
        vec![],
    );
    assert!(layout::validate_request(&req.stations, &req.edges, &req.lines).is_err());
}

/// Worker-thread submission path (spec.md §5) behaves identically to the
/// inline optimizer for a well-formed request.
#[test]
fn worker_submit_matches_inline_optimize() {
    let req = request(
        "worker",
        vec![
            station("A", 0.0, 0.0, &["L1"]),
            station("B", 1.0, 0.0, &["L1"]),
        ],
        vec![edge("e1", "A", "B", &["L1"])],
        vec![line("L1", &["e1"], false)],
    );

    let resp = octoschema::worker::submit_optimize(req);
    assert!(resp.ok, "expected success: {:?}", resp.error);
    assert_eq!(resp.stations.unwrap().len(), 2);
}
