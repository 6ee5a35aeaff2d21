//! The layout optimizer: seed construction, force relaxation, line
//! direction planning, the octilinear constraint, geometric
//! post-processing, label placement, and scoring (spec.md §4).

pub mod constraints;
pub mod direction_plan;
pub mod force;
pub mod labels;
pub mod optimize;
pub mod scoring;
pub mod seed;

pub use optimize::{optimize, validate_request};
