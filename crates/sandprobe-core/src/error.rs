//! Error types for sandprobe-core

use thiserror::Error;

/// Harness-side errors.
///
/// These never describe a sandbox compliance gap; those are [`crate::Failure`]s.
/// A probe that returns one of these is reported as an internal failure.
#[derive(Error, Debug)]
pub enum SandprobeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("nix error: {0}")]
    Nix(#[from] nix::Error),

    #[error("invalid path {path}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("report error: {0}")]
    Report(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}
