use serde::{Deserialize, Serialize};

/// Numeric parameters influencing the optimizer (spec.md §3, "LayoutConfig").
///
/// Deserialization is strict (`deny_unknown_fields`, per spec.md §9: "unknown
/// fields are rejected"); every field has a `#[serde(default = ...)]` so a
/// caller-supplied JSON object naming any subset of fields merges cleanly
/// onto the documented defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutConfig {
    #[serde(default = "d_max_iterations")]
    pub max_iterations: u32,
    #[serde(default = "d_cooling")]
    pub cooling: f64,
    #[serde(default = "d_initial_temperature")]
    pub initial_temperature: f64,
    #[serde(default = "d_anchor_weight")]
    pub anchor_weight: f64,
    #[serde(default = "d_spring_weight")]
    pub spring_weight: f64,
    #[serde(default = "d_angle_weight")]
    pub angle_weight: f64,
    #[serde(default = "d_repulsion_weight")]
    pub repulsion_weight: f64,
    #[serde(default = "d_geo_weight")]
    pub geo_weight: f64,
    #[serde(default = "d_geo_angle_bias")]
    pub geo_angle_bias: f64,
    #[serde(default = "d_geo_seed_scale")]
    pub geo_seed_scale: f64,
    #[serde(default = "d_min_station_distance")]
    pub min_station_distance: f64,
    #[serde(default = "d_min_edge_length")]
    pub min_edge_length: f64,
    #[serde(default = "d_max_edge_length")]
    pub max_edge_length: f64,
    #[serde(default = "d_displacement_limit")]
    pub displacement_limit: f64,
    #[serde(default = "d_hard_crossing_passes")]
    pub hard_crossing_passes: u32,
    #[serde(default = "d_junction_spread_weight")]
    pub junction_spread_weight: f64,
    #[serde(default = "d_crossing_repel_weight")]
    pub crossing_repel_weight: f64,
    #[serde(default = "d_normalize_target_span")]
    pub normalize_target_span: f64,
    #[serde(default = "d_line_direction_passes")]
    pub line_direction_passes: u32,
    #[serde(default = "d_line_direction_blend")]
    pub line_direction_blend: f64,
    #[serde(default = "d_line_data_angle_weight")]
    pub line_data_angle_weight: f64,
    #[serde(default = "d_line_main_direction_weight")]
    pub line_main_direction_weight: f64,
    #[serde(default = "d_line_turn_penalty")]
    pub line_turn_penalty: f64,
    #[serde(default = "d_line_turn_step_penalty")]
    pub line_turn_step_penalty: f64,
    #[serde(default = "d_line_u_turn_penalty")]
    pub line_u_turn_penalty: f64,
    #[serde(default = "d_line_min_run_edges")]
    pub line_min_run_edges: u32,
    #[serde(default = "d_line_short_run_penalty")]
    pub line_short_run_penalty: f64,
    #[serde(default = "d_line_bend_score_weight")]
    pub line_bend_score_weight: f64,
    #[serde(default = "d_line_short_run_score_weight")]
    pub line_short_run_score_weight: f64,
    #[serde(default = "d_octilinear_relax_iterations")]
    pub octilinear_relax_iterations: u32,
    #[serde(default = "d_octilinear_blend")]
    pub octilinear_blend: f64,
    #[serde(default = "d_octilinear_exact_passes")]
    pub octilinear_exact_passes: u32,
    #[serde(default = "d_station_spacing_refine_cycles")]
    pub station_spacing_refine_cycles: u32,
    #[serde(default = "d_label_padding")]
    pub label_padding: f64,
    #[serde(default = "d_straighten_turn_tolerance_deg")]
    pub straighten_turn_tolerance_deg: f64,
    #[serde(default = "d_straighten_strength")]
    pub straighten_strength: f64,
}

macro_rules! default_fns {
    ($($name:ident: $ty:ty = $val:expr;)*) => {
        $(fn $name() -> $ty { $val })*
    };
}

default_fns! {
    d_max_iterations: u32 = 1700;
    d_cooling: f64 = 0.9972;
    d_initial_temperature: f64 = 9.8;
    d_anchor_weight: f64 = 0.0135;
    d_spring_weight: f64 = 0.032;
    d_angle_weight: f64 = 0.02;
    d_repulsion_weight: f64 = 58.0;
    d_geo_weight: f64 = 0.72;
    d_geo_angle_bias: f64 = 0.7;
    d_geo_seed_scale: f64 = 3.0;
    d_min_station_distance: f64 = 30.0;
    d_min_edge_length: f64 = 32.0;
    d_max_edge_length: f64 = 160.0;
    d_displacement_limit: f64 = 230.0;
    d_hard_crossing_passes: u32 = 2;
    d_junction_spread_weight: f64 = 0.24;
    d_crossing_repel_weight: f64 = 20.0;
    d_normalize_target_span: f64 = 1650.0;
    d_line_direction_passes: u32 = 3;
    d_line_direction_blend: f64 = 0.43;
    d_line_data_angle_weight: f64 = 1.25;
    d_line_main_direction_weight: f64 = 0.52;
    d_line_turn_penalty: f64 = 1.55;
    d_line_turn_step_penalty: f64 = 0.62;
    d_line_u_turn_penalty: f64 = 3.6;
    d_line_min_run_edges: u32 = 2;
    d_line_short_run_penalty: f64 = 2.8;
    d_line_bend_score_weight: f64 = 2.6;
    d_line_short_run_score_weight: f64 = 5.4;
    d_octilinear_relax_iterations: u32 = 40;
    d_octilinear_blend: f64 = 0.38;
    d_octilinear_exact_passes: u32 = 3;
    d_station_spacing_refine_cycles: u32 = 3;
    d_label_padding: f64 = 6.0;
    d_straighten_turn_tolerance_deg: f64 = 18.0;
    d_straighten_strength: f64 = 0.58;
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            max_iterations: d_max_iterations(),
            cooling: d_cooling(),
            initial_temperature: d_initial_temperature(),
            anchor_weight: d_anchor_weight(),
            spring_weight: d_spring_weight(),
            angle_weight: d_angle_weight(),
            repulsion_weight: d_repulsion_weight(),
            geo_weight: d_geo_weight(),
            geo_angle_bias: d_geo_angle_bias(),
            geo_seed_scale: d_geo_seed_scale(),
            min_station_distance: d_min_station_distance(),
            min_edge_length: d_min_edge_length(),
            max_edge_length: d_max_edge_length(),
            displacement_limit: d_displacement_limit(),
            hard_crossing_passes: d_hard_crossing_passes(),
            junction_spread_weight: d_junction_spread_weight(),
            crossing_repel_weight: d_crossing_repel_weight(),
            normalize_target_span: d_normalize_target_span(),
            line_direction_passes: d_line_direction_passes(),
            line_direction_blend: d_line_direction_blend(),
            line_data_angle_weight: d_line_data_angle_weight(),
            line_main_direction_weight: d_line_main_direction_weight(),
            line_turn_penalty: d_line_turn_penalty(),
            line_turn_step_penalty: d_line_turn_step_penalty(),
            line_u_turn_penalty: d_line_u_turn_penalty(),
            line_min_run_edges: d_line_min_run_edges(),
            line_short_run_penalty: d_line_short_run_penalty(),
            line_bend_score_weight: d_line_bend_score_weight(),
            line_short_run_score_weight: d_line_short_run_score_weight(),
            octilinear_relax_iterations: d_octilinear_relax_iterations(),
            octilinear_blend: d_octilinear_blend(),
            octilinear_exact_passes: d_octilinear_exact_passes(),
            station_spacing_refine_cycles: d_station_spacing_refine_cycles(),
            label_padding: d_label_padding(),
            straighten_turn_tolerance_deg: d_straighten_turn_tolerance_deg(),
            straighten_strength: d_straighten_strength(),
        }
    }
}

impl LayoutConfig {
    /// Parse a partial JSON object, rejecting unknown keys, merging onto
    /// the documented defaults for any field left unspecified.
    pub fn from_partial_json(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_table() {
        let c = LayoutConfig::default();
        assert_eq!(c.max_iterations, 1700);
        assert!((c.cooling - 0.9972).abs() < 1e-12);
        assert!((c.repulsion_weight - 58.0).abs() < 1e-12);
    }

    #[test]
    fn partial_config_merges_onto_defaults() {
        // Callers submit snake_case keys matching the struct fields directly.
        let v = serde_json::json!({ "max_iterations": 5 });
        let c = LayoutConfig::from_partial_json(v).unwrap();
        assert_eq!(c.max_iterations, 5);
        assert_eq!(c.min_edge_length, 32.0);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let v = serde_json::json!({ "totallyUnknownField": 1 });
        assert!(LayoutConfig::from_partial_json(v).is_err());
    }
}
