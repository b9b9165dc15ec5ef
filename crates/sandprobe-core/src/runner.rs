//! Probe execution loop

use crate::report::Reporter;
use crate::{Failure, JailConfig, Probe, ProbeResult, Registry, Result, RunSummary, Verdict};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Run every registered probe once, in order, reporting each as it finishes.
///
/// A probe that errors or panics is reported as failed and the loop moves on.
/// Only a reporter error ends the run early, since nothing more could be shown.
pub fn run<R: Reporter + ?Sized>(
    registry: &Registry,
    config: &JailConfig,
    reporter: &mut R,
) -> Result<RunSummary> {
    tracing::info!(probes = registry.len(), "starting compliance run");

    let mut summary = RunSummary::default();
    for probe in registry {
        let verdict = execute(probe, config);
        tracing::debug!(probe = probe.name(), status = verdict.status(), "probe finished");

        reporter.probe(&ProbeResult {
            name: probe.name(),
            verdict: &verdict,
        })?;
        summary.record(&verdict);
    }

    reporter.summary(&summary)?;
    tracing::info!(
        ok = summary.ok,
        skipped = summary.skipped,
        failed = summary.failed,
        "compliance run finished"
    );

    Ok(summary)
}

/// Run one probe, folding harness errors and panics into a failed verdict.
pub fn execute(probe: &Probe, config: &JailConfig) -> Verdict {
    match panic::catch_unwind(AssertUnwindSafe(|| probe.check(config))) {
        Ok(Ok(verdict)) => verdict,
        Ok(Err(e)) => {
            tracing::warn!(probe = probe.name(), error = %e, "probe could not run");
            Verdict::Fail(Failure::internal(format!("harness error: {e}")))
        }
        Err(payload) => {
            let msg = panic_message(payload.as_ref());
            tracing::warn!(probe = probe.name(), panic = msg, "probe panicked");
            Verdict::Fail(Failure::internal(format!("probe panicked: {msg}")))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
