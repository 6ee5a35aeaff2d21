//! Structured error taxonomy for the core (spec.md §7).
//!
//! `DegenerateInput` and `TopologyUnsupported` from spec.md's taxonomy are
//! deliberately *not* variants here: per §7 the optimizer recovers from a
//! degenerate input by returning a zero-score success, and the analyzer
//! recovers from an unsupported-topology component by flagging that one
//! component's `reason` field rather than failing the whole request. Only
//! the two kinds that are genuinely fatal to a single request are modeled
//! as a `Result::Err`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed project: duplicate station ids, edges referencing unknown
    /// stations, a line referencing an unknown edge, non-finite
    /// coordinates. The caller should not retry without fixing the input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Never expected in normal operation; surfaced to the caller as
    /// `ok=false` with a generic message, no automatic retry.
    #[error("internal invariant failure: {0}")]
    InternalInvariantFailure(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
