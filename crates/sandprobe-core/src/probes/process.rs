//! Child process creation
//!
//! Any refusal counts as compliant here. A child that actually starts is a
//! breach, so it is reaped and reported.

use super::{REMOVED, expect_denied, io_outcome};
use crate::{JailConfig, Result, Verdict};
use nix::sys::wait::waitpid;
use nix::unistd::{ForkResult, fork};
use std::process::{Command, Stdio};

/// Program `no_spawn` tries to start
pub const SPAWN_PROGRAM: &str = "ls";

pub fn no_fork(_config: &JailConfig) -> Result<Verdict> {
    // SAFETY: the child does nothing but _exit
    let outcome = match unsafe { fork() } {
        // SAFETY: _exit is async-signal-safe and skips atexit handlers the
        // parent still owns
        Ok(ForkResult::Child) => unsafe { libc::_exit(0) },
        Ok(ForkResult::Parent { child }) => {
            tracing::warn!(%child, "fork went through, reaping child");
            if let Err(e) = waitpid(child, None) {
                tracing::debug!(%child, error = %e, "could not reap child");
            }
            Ok(child)
        }
        Err(e) => Err(e),
    };

    Ok(expect_denied("fork", outcome, REMOVED).into())
}

pub fn no_spawn(_config: &JailConfig) -> Result<Verdict> {
    let spawned = Command::new(SPAWN_PROGRAM)
        .arg("-l")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();

    let outcome = io_outcome(spawned).map(|mut child| {
        tracing::warn!(pid = child.id(), "spawn went through, reaping child");
        if let Err(e) = child.kill().and_then(|()| child.wait().map(drop)) {
            tracing::debug!(error = %e, "could not reap child");
        }
    });

    Ok(expect_denied("spawn", outcome, REMOVED).into())
}
