use serde::{Deserialize, Serialize};

use super::station::{EdgeId, StationId};

/// Sentinel trunk index for a left-open (hanging, attaches before the
/// trunk start) interval end, per spec.md §3.
pub const OPEN_LEFT: i64 = -1;
/// Sentinel trunk index for a right-open interval end.
pub const OPEN_RIGHT: i64 = i64::MAX;

/// A branch that diverges from the trunk at one station and either rejoins
/// it later (closed interval) or hangs off one open end (spec.md §3,
/// "Interval").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interval {
    pub from_station_id: Option<StationId>,
    pub to_station_id: Option<StationId>,
    /// Trunk index of the fork point; `OPEN_LEFT` if left-open.
    pub from_index: i64,
    /// Trunk index of the rejoin point; `OPEN_RIGHT` if right-open.
    pub to_index: i64,
    /// Interior stations, excluding the trunk endpoints.
    pub station_ids: Vec<StationId>,
    pub edge_ids: Vec<EdgeId>,
}

impl Interval {
    pub fn is_left_open(&self) -> bool {
        self.from_index == OPEN_LEFT
    }

    pub fn is_right_open(&self) -> bool {
        self.to_index == OPEN_RIGHT
    }
}

/// A hanging branch attached at a non-endpoint trunk station (spec.md §3,
/// "MidHangingBranch").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MidHangingBranch {
    pub attach_to_station_id: StationId,
    pub station_ids: Vec<StationId>,
    pub edge_ids: Vec<EdgeId>,
}

/// The analyzer's decomposition of one connected component of a line into a
/// trunk plus branches (spec.md §3, "BranchTopologyResult").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchTopologyResult {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_loop: Option<bool>,
    #[serde(default)]
    pub trunk_station_ids: Vec<StationId>,
    #[serde(default)]
    pub trunk_edge_ids: Vec<EdgeId>,
    #[serde(default)]
    pub intervals: Vec<Interval>,
    #[serde(default)]
    pub mid_branches: Vec<MidHangingBranch>,
}

impl BranchTopologyResult {
    pub fn invalid(reason: impl Into<String>) -> Self {
        BranchTopologyResult {
            valid: false,
            reason: Some(reason.into()),
            is_loop: None,
            trunk_station_ids: Vec::new(),
            trunk_edge_ids: Vec::new(),
            intervals: Vec::new(),
            mid_branches: Vec::new(),
        }
    }

    /// Every edge id covered by this component's decomposition (trunk,
    /// intervals, and mid-hanging branches), used by the topology-coverage
    /// invariant (spec.md §8, property 8).
    pub fn covered_edge_ids(&self) -> std::collections::BTreeSet<EdgeId> {
        let mut set: std::collections::BTreeSet<EdgeId> =
            self.trunk_edge_ids.iter().cloned().collect();
        for iv in &self.intervals {
            set.extend(iv.edge_ids.iter().cloned());
        }
        for mb in &self.mid_branches {
            set.extend(mb.edge_ids.iter().cloned());
        }
        set
    }
}
