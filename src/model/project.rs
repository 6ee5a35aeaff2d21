use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::config::LayoutConfig;
use super::edge::Edge;
use super::line::Line;
use super::station::{EdgeId, Station, StationId};

/// Anchor point of a station label relative to its station marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelAnchor {
    Start,
    Middle,
    End,
}

/// A chosen label placement for one station (spec.md §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StationLabel {
    pub dx: f64,
    pub dy: f64,
    pub anchor: LabelAnchor,
}

/// The optimizer's output beyond positions: label placements and per-edge
/// octilinear direction indices (spec.md §3, "Project.layoutMeta").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutMeta {
    #[serde(default)]
    pub station_labels: HashMap<StationId, StationLabel>,
    /// Octilinear direction index 0..7 per edge.
    #[serde(default)]
    pub edge_directions: HashMap<EdgeId, u8>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectMeta {
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// The JSON document exchanged with the enclosing application (spec.md
/// §6.3). The core treats `timeline_events` and `region_boundary` as opaque
/// passthrough data it never interprets, so a round trip through
/// `serde_json` preserves every field the importer set even though this
/// crate has no behavior attached to them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub project_version: String,
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub region_boundary: Option<serde_json::Value>,
    pub stations: Vec<Station>,
    pub edges: Vec<Edge>,
    pub lines: Vec<Line>,
    #[serde(default)]
    pub layout_config: LayoutConfig,
    #[serde(default)]
    pub layout_meta: LayoutMeta,
    #[serde(default)]
    pub timeline_events: Option<serde_json::Value>,
    #[serde(default)]
    pub meta: ProjectMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json_losslessly() {
        let project = Project {
            project_version: "1.0.0".into(),
            id: "proj-1".into(),
            name: "Demo Metro".into(),
            region: Some("demo-region".into()),
            region_boundary: Some(serde_json::json!({"type": "Polygon", "coordinates": []})),
            stations: vec![],
            edges: vec![],
            lines: vec![],
            layout_config: LayoutConfig::default(),
            layout_meta: LayoutMeta::default(),
            timeline_events: Some(serde_json::json!([{"t": 1}])),
            meta: ProjectMeta::default(),
        };
        let json = serde_json::to_value(&project).unwrap();
        let round_tripped: Project = serde_json::from_value(json.clone()).unwrap();
        let json_again = serde_json::to_value(&round_tripped).unwrap();
        assert_eq!(json, json_again);
    }
}
