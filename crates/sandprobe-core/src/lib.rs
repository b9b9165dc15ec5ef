//! # sandprobe-core
//!
//! Compliance probes for process-isolation sandboxes.
//!
//! Run from *inside* a sandbox, this crate checks that the environment
//! enforces what it claims:
//! - a virtual filesystem root that hides the host tree
//! - removed syscalls failing with `ENOSYS`
//! - policy-restricted syscalls failing with `EACCES`
//! - shared libraries resolvable by absolute path and by search path
//!
//! Probes are registered in a [`Registry`], executed in order by [`run`],
//! tallied into a [`RunSummary`] and rendered by a [`report::Reporter`].

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod probes;
pub mod registry;
pub mod report;
pub mod runner;
pub mod summary;
pub mod verdict;

pub use config::JailConfig;
pub use error::SandprobeError;
pub use registry::{Probe, Registry};
pub use runner::run;
pub use summary::RunSummary;
pub use verdict::{Failure, FailureKind, ProbeResult, Verdict};

/// Crate-level result type
pub type Result<T> = std::result::Result<T, SandprobeError>;
