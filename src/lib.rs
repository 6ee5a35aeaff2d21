//! Octilinear metro-map layout optimizer and branch-topology analyzer
//! (spec.md §1-§2).

pub mod cli;
pub mod error;
pub mod geo_kernel;
pub mod layout;
pub mod model;
pub mod telemetry;
pub mod topology;
pub mod worker;
