use serde::{Deserialize, Serialize};

use super::config::LayoutConfig;
use super::edge::Edge;
use super::line::Line;
use super::project::{LayoutMeta, Project};
use super::score::ScoreBreakdown;
use super::station::{LineId, Station, StationWithDisplayPos};
use super::topology::BranchTopologyResult;

/// `OptimizeRequest` (spec.md §6.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeRequest {
    pub stations: Vec<Station>,
    pub edges: Vec<Edge>,
    pub lines: Vec<Line>,
    #[serde(default)]
    pub config: LayoutConfig,
    pub request_id: String,
}

/// `OptimizeResponse` (spec.md §6.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeResponse {
    pub request_id: String,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stations: Option<Vec<StationWithDisplayPos>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<ScoreBreakdown>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_meta: Option<LayoutMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OptimizeResponse {
    pub fn failure(request_id: impl Into<String>, error: impl Into<String>) -> Self {
        OptimizeResponse {
            request_id: request_id.into(),
            ok: false,
            stations: None,
            score: None,
            breakdown: None,
            layout_meta: None,
            elapsed_ms: None,
            error: Some(error.into()),
        }
    }
}

/// `AnalyzeRequest` (spec.md §6.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub project: Project,
    pub line_id: LineId,
}

/// `AnalyzeResponse` (spec.md §6.2): one `BranchTopologyResult` per
/// connected component of the line.
pub type AnalyzeResponse = Vec<BranchTopologyResult>;
