use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

pub type StationId = String;
pub type EdgeId = String;
pub type LineId = String;

/// Localized display name carried in two scripts (e.g. a native script and
/// an English transliteration). Either may be empty but both fields are
/// always present so downstream renderers never have to guess which script
/// a bare string is in.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LocalizedName {
    #[serde(default)]
    pub primary: String,
    #[serde(default)]
    pub secondary: String,
}

/// A node of the network with a geographic coordinate and names.
///
/// Created by the importer or the editor, never by the core; the core's
/// only mutation is replacing `display_pos` with a freshly computed layout
/// position (see spec.md §3, "Station").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Station {
    pub id: StationId,
    pub name: LocalizedName,
    /// Geographic longitude, must be finite.
    pub lng: f64,
    /// Geographic latitude, must be finite.
    pub lat: f64,
    /// Lines this station belongs to. Membership >= 2 means interchange.
    #[serde(default)]
    pub line_ids: BTreeSet<LineId>,
    /// Computed layout position (Cartesian), set only by the optimizer.
    #[serde(default)]
    pub display_pos: Option<[f64; 2]>,
}

impl Station {
    pub fn is_interchange(&self) -> bool {
        self.line_ids.len() >= 2
    }

    pub fn coord_finite(&self) -> bool {
        self.lng.is_finite() && self.lat.is_finite()
    }
}

/// A station paired with its optimizer-assigned display position, as
/// returned in `OptimizeResponse.stations` (spec.md §6.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationWithDisplayPos {
    pub id: StationId,
    pub display_pos: [f64; 2],
}
