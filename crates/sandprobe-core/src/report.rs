//! Rendering probe results
//!
//! The text format is the compliance protocol consumed by gating scripts:
//! one `<status> <name>` line per probe, then the totals.

use crate::{ProbeResult, Result, RunSummary, Verdict};
use serde::Serialize;
use std::io::Write;

/// Receives each result as it is produced, then the totals
pub trait Reporter {
    fn probe(&mut self, result: &ProbeResult<'_>) -> Result<()>;
    fn summary(&mut self, summary: &RunSummary) -> Result<()>;
}

/// Render one protocol line, without the trailing newline
#[must_use]
pub fn format_line(result: &ProbeResult<'_>) -> String {
    let status = result.verdict.status();
    match result.verdict {
        Verdict::Pass => format!("{status:<4} {}", result.name),
        Verdict::Skip(reason) if reason.is_empty() => format!("{status:<4} {}", result.name),
        Verdict::Skip(reason) => format!("{status:<4} {}: {reason}", result.name),
        Verdict::Fail(failure) => format!("{status:<4} {}: {failure}", result.name),
    }
}

/// Plain-text protocol
#[derive(Debug)]
pub struct TextReporter<W: Write> {
    out: W,
}

impl<W: Write> TextReporter<W> {
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Reporter for TextReporter<W> {
    fn probe(&mut self, result: &ProbeResult<'_>) -> Result<()> {
        writeln!(self.out, "{}", format_line(result))?;
        // A probe that takes the process down must not swallow earlier lines
        self.out.flush()?;
        Ok(())
    }

    fn summary(&mut self, summary: &RunSummary) -> Result<()> {
        writeln!(self.out, "{summary}")?;
        self.out.flush()?;
        Ok(())
    }
}

#[derive(Serialize)]
struct JsonProbe<'a> {
    name: &'a str,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<&'static str>,
}

impl<'a> From<&ProbeResult<'a>> for JsonProbe<'a> {
    fn from(result: &ProbeResult<'a>) -> Self {
        let (status, message, kind) = match result.verdict {
            Verdict::Pass => ("ok", None, None),
            Verdict::Skip(reason) => {
                let reason = Some(reason.as_str()).filter(|r| !r.is_empty());
                ("skip", reason, None)
            }
            Verdict::Fail(failure) => (
                "err",
                Some(failure.detail.as_str()),
                Some(failure.kind.label()),
            ),
        };
        Self {
            name: result.name,
            status,
            message,
            kind,
        }
    }
}

/// One JSON object per line, totals last
#[derive(Debug)]
pub struct JsonReporter<W: Write> {
    out: W,
}

impl<W: Write> JsonReporter<W> {
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Reporter for JsonReporter<W> {
    fn probe(&mut self, result: &ProbeResult<'_>) -> Result<()> {
        serde_json::to_writer(&mut self.out, &JsonProbe::from(result))?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }

    fn summary(&mut self, summary: &RunSummary) -> Result<()> {
        serde_json::to_writer(&mut self.out, summary)?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}
