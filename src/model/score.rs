use serde::{Deserialize, Serialize};

/// Eight non-negative weighted penalty components that define layout
/// quality (spec.md §3, "ScoreBreakdown"). Every component is sanitized
/// (NaN/-Inf/+Inf -> 0) before being stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub angle: f64,
    pub length: f64,
    pub overlap: f64,
    pub crossing: f64,
    pub bend: f64,
    pub short_run: f64,
    pub geo_deviation: f64,
    pub label_overlap: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        self.angle
            + self.length
            + self.overlap
            + self.crossing
            + self.bend
            + self.short_run
            + self.geo_deviation
            + self.label_overlap
    }

    /// Replace every non-finite component with 0, per spec.md §3/§7.
    pub fn sanitized(mut self) -> Self {
        for v in [
            &mut self.angle,
            &mut self.length,
            &mut self.overlap,
            &mut self.crossing,
            &mut self.bend,
            &mut self.short_run,
            &mut self.geo_deviation,
            &mut self.label_overlap,
        ] {
            if !v.is_finite() {
                *v = 0.0;
            }
        }
        self
    }
}
