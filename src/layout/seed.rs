//! Seed normalization and edge records (spec.md §4.1).
//!
//! A two-pass build: collect the stations actually used by the line set,
//! then derive each edge's `desired_length` from planar seed distance.

use rustc_hash::FxHashMap;

use crate::geo_kernel::{self, Point};
use crate::model::{Edge, LayoutConfig, Station, StationId};

pub struct SeedData {
    /// Index in these parallel arrays is the node index used throughout
    /// `layout` and referenced by `EdgeRecord::{from,to}`.
    pub station_ids: Vec<StationId>,
    pub index_of: FxHashMap<StationId, usize>,
    /// Anchor (geographic, normalized) positions. Never mutated after
    /// construction.
    pub anchors: Vec<Point>,
    /// Working positions, mutated by the optimizer.
    pub positions: Vec<Point>,
}

#[derive(Debug, Clone)]
pub struct EdgeRecord {
    pub id: String,
    pub from: usize,
    pub to: usize,
    pub desired_length: f64,
    pub line_ids: std::collections::BTreeSet<String>,
}

/// Scale every anchor point by `(normalizeTargetSpan * geoSeedScale) / span`
/// and translate so the minimum corner is at the origin (spec.md §4.1,
/// "Seed positions").
pub fn build_seed(stations: &[Station]) -> SeedData {
    let mut index_of = FxHashMap::default();
    let mut station_ids = Vec::with_capacity(stations.len());
    let mut raw: Vec<Point> = Vec::with_capacity(stations.len());

    for (i, s) in stations.iter().enumerate() {
        index_of.insert(s.id.clone(), i);
        station_ids.push(s.id.clone());
        raw.push([s.lng, s.lat]);
    }

    SeedData {
        station_ids,
        index_of,
        anchors: raw.clone(),
        positions: raw,
    }
}

/// Normalize in place: must be called once, before force relaxation.
pub fn normalize_seed(seed: &mut SeedData, config: &LayoutConfig) {
    if seed.anchors.is_empty() {
        return;
    }
    let mut min = [f64::INFINITY, f64::INFINITY];
    let mut max = [f64::NEG_INFINITY, f64::NEG_INFINITY];
    for p in &seed.anchors {
        min[0] = min[0].min(p[0]);
        min[1] = min[1].min(p[1]);
        max[0] = max[0].max(p[0]);
        max[1] = max[1].max(p[1]);
    }
    let width = max[0] - min[0];
    let height = max[1] - min[1];
    let span = width.max(height);
    let scale = if span > 1e-12 {
        (config.normalize_target_span * config.geo_seed_scale) / span
    } else {
        1.0
    };

    for p in seed.anchors.iter_mut() {
        p[0] = (p[0] - min[0]) * scale;
        p[1] = (p[1] - min[1]) * scale;
    }
    seed.positions = seed.anchors.clone();
}

/// Build edge records, resolving endpoint indices and dropping self-loops
/// (spec.md §4.1, "Edge records"). Returns the records and the count of
/// dropped self-loop edges (for logging).
pub fn build_edge_records(
    edges: &[Edge],
    seed: &SeedData,
    config: &LayoutConfig,
) -> (Vec<EdgeRecord>, usize) {
    let mut records = Vec::with_capacity(edges.len());
    let mut dropped = 0usize;

    for e in edges {
        if e.is_self_loop() {
            dropped += 1;
            continue;
        }
        let (Some(&from), Some(&to)) = (seed.index_of.get(&e.from), seed.index_of.get(&e.to))
        else {
            continue;
        };
        let base_length = geo_kernel::distance(seed.anchors[from], seed.anchors[to]);
        let desired_length = (34.0 + base_length.min(280.0) * 0.2)
            .clamp(config.min_edge_length, config.max_edge_length);
        records.push(EdgeRecord {
            id: e.id.clone(),
            from,
            to,
            desired_length,
            line_ids: e.shared_by_line_ids.clone(),
        });
    }

    (records, dropped)
}

/// Undirected adjacency list: node index -> neighbor node indices (each
/// entry paired with the edge-record index connecting them).
pub fn build_adjacency(node_count: usize, edges: &[EdgeRecord]) -> Vec<Vec<(usize, usize)>> {
    let mut adjacency = vec![Vec::new(); node_count];
    for (ei, e) in edges.iter().enumerate() {
        adjacency[e.from].push((e.to, ei));
        adjacency[e.to].push((e.from, ei));
    }
    adjacency
}

pub fn degree(adjacency: &[Vec<(usize, usize)>], node: usize) -> usize {
    adjacency[node].len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LocalizedName;

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

    #[test]
    fn normalize_scales_span_to_target() {
        let stations = vec![station("a", 0.0, 0.0), station("b", 1.0, 0.0)];
        let mut seed = build_seed(&stations);
        let config = LayoutConfig::default();
        normalize_seed(&mut seed, &config);
        let span = geo_kernel::distance(seed.anchors[0], seed.anchors[1]);
        let expected = config.normalize_target_span * config.geo_seed_scale;
        assert!((span - expected).abs() < 1e-6);
    }

    #[test]
    fn self_loops_are_dropped() {
        let stations = vec![station("a", 0.0, 0.0)];
        let seed = build_seed(&stations);
        let edges = vec![Edge {
            id: "e1".into(),
            from: "a".into(),
            to: "a".into(),
            waypoints: vec![],
            length_meters: 0.0,
            shared_by_line_ids: Default::default(),
        }];
        let config = LayoutConfig::default();
        let (records, dropped) = build_edge_records(&edges, &seed, &config);
        assert_eq!(dropped, 1);
        assert!(records.is_empty());
    }
}
