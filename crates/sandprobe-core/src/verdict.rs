//! Probe verdicts

use nix::errno::Errno;
use std::fmt;
use thiserror::Error;

/// Why a probe failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// A call that must be denied went through
    UnexpectedSuccess { expected: Errno },
    /// A call was denied, but with the wrong error code
    WrongErrno { expected: Errno, actual: Errno },
    /// A call that must succeed did not
    OperationFailed,
    /// The filesystem is not shaped as expected
    Layout,
    /// The probe itself broke
    Internal,
}

impl FailureKind {
    /// Short stable label, used by machine-readable reports
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::UnexpectedSuccess { .. } => "unexpected_success",
            Self::WrongErrno { .. } => "wrong_errno",
            Self::OperationFailed => "operation_failed",
            Self::Layout => "layout",
            Self::Internal => "internal",
        }
    }
}

/// A compliance gap found by a probe
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{detail}")]
pub struct Failure {
    pub kind: FailureKind,
    pub detail: String,
}

impl Failure {
    /// `op` went through although the sandbox should have refused it with `expected`
    #[must_use]
    pub fn unexpected_success(op: &str, expected: Errno) -> Self {
        Self {
            kind: FailureKind::UnexpectedSuccess { expected },
            detail: format!("{op} succeeded when expected {expected:?}"),
        }
    }

    /// `op` was refused, but for the wrong reason
    #[must_use]
    pub fn wrong_errno(op: &str, expected: Errno, actual: Errno) -> Self {
        Self {
            kind: FailureKind::WrongErrno { expected, actual },
            detail: format!("{op} failed with {} when expected {expected:?}", actual.desc()),
        }
    }

    #[must_use]
    pub fn operation_failed(detail: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::OperationFailed,
            detail: detail.into(),
        }
    }

    #[must_use]
    pub fn layout(detail: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Layout,
            detail: detail.into(),
        }
    }

    #[must_use]
    pub fn internal(detail: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Internal,
            detail: detail.into(),
        }
    }
}

/// Outcome of a single probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Skip(String),
    Fail(Failure),
}

impl Verdict {
    #[must_use]
    pub const fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }

    #[must_use]
    pub const fn is_skip(&self) -> bool {
        matches!(self, Self::Skip(_))
    }

    #[must_use]
    pub const fn is_fail(&self) -> bool {
        matches!(self, Self::Fail(_))
    }

    /// The failure, if this verdict is one
    #[must_use]
    pub const fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Fail(failure) => Some(failure),
            _ => None,
        }
    }

    /// Status token printed in front of the probe name
    #[must_use]
    pub const fn status(&self) -> &'static str {
        match self {
            Self::Pass => "ok",
            Self::Skip(_) => "SKIP",
            Self::Fail(_) => "ERR",
        }
    }
}

impl From<std::result::Result<(), Failure>> for Verdict {
    fn from(outcome: std::result::Result<(), Failure>) -> Self {
        match outcome {
            Ok(()) => Self::Pass,
            Err(failure) => Self::Fail(failure),
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => f.write_str("ok"),
            Self::Skip(reason) if reason.is_empty() => f.write_str("SKIP"),
            Self::Skip(reason) => write!(f, "SKIP: {reason}"),
            Self::Fail(failure) => write!(f, "ERR: {failure}"),
        }
    }
}

/// A probe's name paired with its verdict, alive only while it is reported
#[derive(Debug, Clone, Copy)]
pub struct ProbeResult<'a> {
    pub name: &'a str,
    pub verdict: &'a Verdict,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unexpected_success_names_expected_code() {
        let failure = Failure::unexpected_success("fork", Errno::ENOSYS);
        assert_eq!(failure.detail, "fork succeeded when expected ENOSYS");
        assert_eq!(
            failure.kind,
            FailureKind::UnexpectedSuccess { expected: Errno::ENOSYS }
        );
    }

    #[test]
    fn wrong_errno_names_both_codes() {
        let failure = Failure::wrong_errno("kill", Errno::ENOSYS, Errno::EPERM);
        assert!(failure.detail.starts_with("kill failed with "));
        assert!(failure.detail.ends_with("when expected ENOSYS"));
        assert!(failure.detail.contains(Errno::EPERM.desc()));
        assert_eq!(failure.kind.label(), "wrong_errno");
    }

    #[test]
    fn result_converts_to_verdict() {
        assert_eq!(Verdict::from(Ok(())), Verdict::Pass);
        let verdict = Verdict::from(Err(Failure::layout("Expected a directory: /python")));
        assert!(verdict.is_fail());
        assert_eq!(verdict.status(), "ERR");
        assert_eq!(verdict.to_string(), "ERR: Expected a directory: /python");
    }

    #[test]
    fn skip_is_neither_pass_nor_fail() {
        let verdict = Verdict::Skip("not applicable".into());
        assert!(verdict.is_skip());
        assert!(!verdict.is_pass());
        assert!(verdict.failure().is_none());
    }
}
