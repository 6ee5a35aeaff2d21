//! One worker thread per optimize request (spec.md §5, "Scheduling model").
//!
//! `std::thread` + `std::sync::mpsc` rather than an async runtime: the
//! optimizer never suspends, runs to completion exactly once per call, and
//! shares no mutable state across requests, so a thread pool or executor
//! would add machinery the workload doesn't need.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread;

use crate::layout;
use crate::model::{OptimizeRequest, OptimizeResponse};

/// Run one optimize request on a fresh background thread and block until it
/// completes. A panic inside the optimizer is caught and reported as
/// `ok=false` rather than propagating (spec.md §7, "InternalInvariantFailure").
pub fn submit_optimize(request: OptimizeRequest) -> OptimizeResponse {
    let request_id = request.request_id.clone();
    let (tx, rx) = mpsc::channel();

    let spawned = thread::Builder::new()
        .name(format!("optimize-{request_id}"))
        .spawn(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| layout::optimize(&request)));
            let response = outcome.unwrap_or_else(|_| {
                OptimizeResponse::failure(
                    request.request_id.clone(),
                    "internal invariant failure during layout optimization",
                )
            });
            let _ = tx.send(response);
        });

    if spawned.is_err() {
        return OptimizeResponse::failure(request_id, "failed to start optimizer worker thread");
    }

    rx.recv()
        .unwrap_or_else(|_| OptimizeResponse::failure(request_id, "optimizer worker thread died"))
}
