use serde::{Deserialize, Serialize};

use super::station::{EdgeId, LineId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineStatus {
    Open,
    UnderConstruction,
    Proposed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineStyle {
    Solid,
    Dashed,
    Dotted,
}

/// An ordered/marked collection of edges constituting one route; may be a
/// loop (spec.md §3, "Line").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Line {
    pub id: LineId,
    pub name: super::station::LocalizedName,
    /// Hex color, e.g. "#E3120B".
    pub color: String,
    pub status: LineStatus,
    pub style: LineStyle,
    #[serde(default)]
    pub is_loop: bool,
    /// Ordered edge-id list.
    pub edge_ids: Vec<EdgeId>,
}
