//! Top-level optimizer orchestration (spec.md §4, pipeline overview in §2).
//!
//! Validate up front, run the pipeline, wrap every stage in a
//! `tracing::instrument` span so failures are traceable without a debugger.

use std::collections::{BTreeSet, HashSet};
use std::time::Instant;

use rustc_hash::FxHashMap;
use tracing::instrument;

use crate::error::{CoreError, CoreResult};
use crate::layout::{constraints, direction_plan, force, labels, scoring, seed};
use crate::model::{
    Edge, Line, LayoutMeta, OptimizeRequest, OptimizeResponse, ScoreBreakdown, Station,
    StationWithDisplayPos,
};

/// Validate structural invariants that must hold before the optimizer can
/// run at all (spec.md §7, "InvalidInput"): duplicate station ids, edges
/// referencing unknown stations, lines referencing unknown edges, and
/// non-finite coordinates.
pub fn validate_request(stations: &[Station], edges: &[Edge], lines: &[Line]) -> CoreResult<()> {
    let mut seen_station_ids = HashSet::new();
    for s in stations {
        if !seen_station_ids.insert(&s.id) {
            return Err(CoreError::InvalidInput(format!(
                "duplicate station id: {}",
                s.id
            )));
        }
        if !s.coord_finite() {
            return Err(CoreError::InvalidInput(format!(
                "station {} has a non-finite coordinate",
                s.id
            )));
        }
    }

    let station_ids: HashSet<&String> = stations.iter().map(|s| &s.id).collect();
    let mut seen_edge_ids = HashSet::new();
    for e in edges {
        if !seen_edge_ids.insert(&e.id) {
            return Err(CoreError::InvalidInput(format!(
                "duplicate edge id: {}",
                e.id
            )));
        }
        if !station_ids.contains(&e.from) || !station_ids.contains(&e.to) {
            return Err(CoreError::InvalidInput(format!(
                "edge {} references an unknown station",
                e.id
            )));
        }
    }

    let edge_ids: HashSet<&String> = edges.iter().map(|e| &e.id).collect();
    for line in lines {
        for eid in &line.edge_ids {
            if !edge_ids.contains(eid) {
                return Err(CoreError::InvalidInput(format!(
                    "line {} references unknown edge {}",
                    line.id, eid
                )));
            }
        }
    }

    Ok(())
}

fn degree_and_interchange(
    stations: &[Station],
    adjacency: &[Vec<(usize, usize)>],
) -> (Vec<usize>, Vec<bool>) {
    let degree: Vec<usize> = adjacency.iter().map(|n| n.len()).collect();
    let interchange: Vec<bool> = stations.iter().map(|s| s.is_interchange()).collect();
    (degree, interchange)
}

/// Run the full optimize pipeline: seed, force relaxation, line direction
/// planning, octilinear constraint, geometric post-processing, label
/// placement, and scoring (spec.md §2's module overview).
#[instrument(skip_all, fields(request_id = %request.request_id))]
pub fn optimize(request: &OptimizeRequest) -> OptimizeResponse {
    let started = Instant::now();

    if let Err(e) = validate_request(&request.stations, &request.edges, &request.lines) {
        return OptimizeResponse::failure(request.request_id.clone(), e.to_string());
    }

    // Degenerate input: nothing to lay out. Spec.md §7 treats this as a
    // successful, zero-score response rather than an error.
    if request.stations.is_empty() {
        return OptimizeResponse {
            request_id: request.request_id.clone(),
            ok: true,
            stations: Some(Vec::new()),
            score: Some(0.0),
            breakdown: Some(ScoreBreakdown::default()),
            layout_meta: Some(LayoutMeta::default()),
            elapsed_ms: Some(started.elapsed().as_secs_f64() * 1000.0),
            error: None,
        };
    }

    let config = request.config;
    let mut seed_data = seed::build_seed(&request.stations);
    seed::normalize_seed(&mut seed_data, &config);
    let (edge_records, dropped) = seed::build_edge_records(&request.edges, &seed_data, &config);
    if dropped > 0 {
        tracing::debug!(dropped, "self-loop edges excluded from layout");
    }
    let adjacency = seed::build_adjacency(seed_data.station_ids.len(), &edge_records);
    let (degree, interchange) = degree_and_interchange(&request.stations, &adjacency);

    let mut positions = seed_data.positions.clone();

    force::relax(
        &mut positions,
        &force::ForceContext {
            anchors: &seed_data.anchors,
            edges: &edge_records,
            adjacency: &adjacency,
            config: &config,
        },
    );

    let edge_index_of_id: FxHashMap<String, usize> = edge_records
        .iter()
        .enumerate()
        .map(|(i, e)| (e.id.clone(), i))
        .collect();

    let edge_directions = direction_plan::plan_all_lines(
        &mut positions,
        &request.lines,
        &edge_index_of_id,
        &edge_records,
        &degree,
        &interchange,
        &config,
    );

    // Geometric post-processing, spec.md §4.3's 8 ordered steps: soft snap,
    // corridor straighten, compact long edges, soft snap again, the
    // octilinear hard constraint, a displacement clamp, hard crossing
    // repulsion, then proximity repel + a strict re-snap + spacing
    // enforcement cycled until stations stop overlapping.
    constraints::soft_octilinear_snap(&mut positions, &edge_records, 0.18);
    constraints::corridor_straighten(
        &mut positions,
        &request.lines,
        &edge_index_of_id,
        &edge_records,
        &interchange,
        &config,
    );
    constraints::compact_long_edges(&mut positions, &edge_records, &config);
    constraints::soft_octilinear_snap(&mut positions, &edge_records, 0.24);

    constraints::relax_octilinear(&mut positions, &edge_records, &degree, &interchange, &config);
    force::clamp_displacement(
        &mut positions,
        &force::ForceContext {
            anchors: &seed_data.anchors,
            edges: &edge_records,
            adjacency: &adjacency,
            config: &config,
        },
    );

    for _ in 0..config.hard_crossing_passes {
        constraints::hard_crossing_pass(&mut positions, &edge_records, &config);
    }

    for _ in 0..config.station_spacing_refine_cycles {
        constraints::proximity_repel(&mut positions, &adjacency, &config);
        constraints::exact_octilinear_pass(&mut positions, &edge_records, &degree);
        constraints::enforce_min_edge_length(&mut positions, &edge_records, &config);
    }

    let (station_labels, label_boxes) = labels::place_labels(
        &request.stations,
        &positions,
        &edge_records,
        &degree,
        &config,
    );

    let breakdown = scoring::score(&scoring::ScoringInput {
        positions: &positions,
        anchors: &seed_data.anchors,
        edges: &edge_records,
        adjacency: &adjacency,
        edge_directions: &edge_directions,
        lines: &request.lines,
        edge_index_of_id: &edge_index_of_id,
        label_boxes: &label_boxes,
        config: &config,
    });

    let station_results: Vec<StationWithDisplayPos> = seed_data
        .station_ids
        .iter()
        .enumerate()
        .map(|(i, id)| StationWithDisplayPos {
            id: id.clone(),
            display_pos: positions[i],
        })
        .collect();

    let edge_directions_by_id: std::collections::HashMap<String, u8> = edge_directions
        .into_iter()
        .map(|(ei, d)| (edge_records[ei].id.clone(), d))
        .collect();

    let layout_meta = LayoutMeta {
        station_labels: station_labels
            .into_iter()
            .collect::<std::collections::HashMap<_, _>>(),
        edge_directions: edge_directions_by_id,
    };

    OptimizeResponse {
        request_id: request.request_id.clone(),
        ok: true,
        stations: Some(station_results),
        score: Some(breakdown.total()),
        breakdown: Some(breakdown),
        layout_meta: Some(layout_meta),
        elapsed_ms: Some(started.elapsed().as_secs_f64() * 1000.0),
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Edge, Line, LineStatus, LineStyle, LocalizedName, Station};

    fn station(id: &str, lng: f64, lat: f64) -> Station {
        Station {
            id: id.into(),
            name: LocalizedName::default(),
            lng,
            lat,
            line_ids: BTreeSet::from([String::from("l1")]),
            display_pos: None,
        }
    }

    fn edge(id: &str, from: &str, to: &str) -> Edge {
        Edge {
            id: id.into(),
            from: from.into(),
            to: to.into(),
            waypoints: vec![],
            length_meters: 500.0,
            shared_by_line_ids: BTreeSet::from([String::from("l1")]),
        }
    }

    #[test]
    fn empty_stations_is_a_successful_zero_score_response() {
        let request = OptimizeRequest {
            stations: vec![],
            edges: vec![],
            lines: vec![],
            config: Default::default(),
            request_id: "r1".into(),
        };
        let response = optimize(&request);
        assert!(response.ok);
        assert_eq!(response.score, Some(0.0));
    }

    #[test]
    fn duplicate_station_id_is_rejected() {
        let stations = vec![station("a", 0.0, 0.0), station("a", 1.0, 1.0)];
        assert!(validate_request(&stations, &[], &[]).is_err());
    }

    #[test]
    fn small_line_optimizes_to_a_valid_response() {
        let stations = vec![
            station("a", 0.0, 0.0),
            station("b", 0.01, 0.0),
            station("c", 0.02, 0.01),
        ];
        let edges = vec![edge("e1", "a", "b"), edge("e2", "b", "c")];
        let lines = vec![Line {
            id: "l1".into(),
            name: LocalizedName::default(),
            color: "#ff0000".into(),
            status: LineStatus::Open,
            style: LineStyle::Solid,
            is_loop: false,
            edge_ids: vec!["e1".into(), "e2".into()],
        }];
        let request = OptimizeRequest {
            stations,
            edges,
            lines,
            config: Default::default(),
            request_id: "r2".into(),
        };
        let response = optimize(&request);
        assert!(response.ok);
        assert_eq!(response.stations.as_ref().unwrap().len(), 3);
        assert!(response.score.unwrap().is_finite());
    }
}
