use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::station::{EdgeId, LineId, StationId};

/// A single lng/lat waypoint along an edge's physical path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub lng: f64,
    pub lat: f64,
}

/// A direct connection between two stations; a physical segment of track.
///
/// Invariants (spec.md §3, "Edge"): both endpoints resolve to valid station
/// ids, every line in `shared_by_line_ids` is a valid line, and
/// `shared_by_line_ids` is non-empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub from: StationId,
    pub to: StationId,
    /// Ordered waypoint polyline; if fewer than two points, the endpoints
    /// are used as a straight line.
    #[serde(default)]
    pub waypoints: Vec<Waypoint>,
    /// Length in meters; non-negative, may be zero if missing.
    #[serde(default)]
    pub length_meters: f64,
    #[serde(default)]
    pub shared_by_line_ids: BTreeSet<LineId>,
}

impl Edge {
    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }

    /// The outward tangent direction at `from` end, approximated by the
    /// first waypoint segment (or the straight line to `to` if there are
    /// fewer than two waypoints). Used by the branch-topology analyzer's
    /// degree-3 spur disambiguation (spec.md §4.9).
    pub fn waypoint_polyline(
        &self,
        from_coord: (f64, f64),
        to_coord: (f64, f64),
    ) -> Vec<(f64, f64)> {
        if self.waypoints.len() >= 2 {
            self.waypoints.iter().map(|w| (w.lng, w.lat)).collect()
        } else {
            vec![from_coord, to_coord]
        }
    }
}
