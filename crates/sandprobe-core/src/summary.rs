//! Run totals

use crate::Verdict;
use serde::Serialize;
use std::fmt;

/// Counts across one run. `ok + skipped + failed` equals the probes executed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    #[serde(rename = "succeeded")]
    pub ok: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunSummary {
    /// Count one verdict
    pub fn record(&mut self, verdict: &Verdict) {
        match verdict {
            Verdict::Pass => self.ok += 1,
            Verdict::Skip(_) => self.skipped += 1,
            Verdict::Fail(_) => self.failed += 1,
        }
    }

    #[must_use]
    pub const fn total(&self) -> usize {
        self.ok + self.skipped + self.failed
    }

    /// Skips never make a run fail
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.failed == 0
    }

    /// Process exit status for this run
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        if self.passed() { 0 } else { 1 }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} succeeded, {} skipped, {} failed",
            self.ok, self.skipped, self.failed
        )
    }
}
