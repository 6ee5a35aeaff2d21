//! Structured logging setup (spec.md §9's ambient stack).

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize `tracing` for the CLI binary. Respects `RUST_LOG`, defaulting
/// to `info` when unset.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(false).init();
}
