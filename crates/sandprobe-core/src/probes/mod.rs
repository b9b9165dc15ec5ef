//! Sandbox compliance probes
//!
//! Each probe exercises one enforcement boundary:
//! - `filesystem` - virtual root layout and host tree visibility
//! - `syscall` - removed and policy-restricted syscalls
//! - `process` - child process creation
//! - `dylib` - shared library loading
//! - `clock` - wall clock plausibility
//!
//! Probes only observe. Anything they open is closed before they return.

pub mod clock;
pub mod dylib;
pub mod filesystem;
pub mod process;
pub mod syscall;

use crate::{Failure, Result, SandprobeError};
use nix::errno::Errno;
use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

/// Code a sandbox returns for syscalls it does not implement at all
pub const REMOVED: Errno = Errno::ENOSYS;

/// Code a sandbox returns for syscalls it implements but refuses
pub const REFUSED: Errno = Errno::EACCES;

/// Pass only if `outcome` is a failure carrying exactly `expected`.
pub fn expect_errno<T>(
    op: &str,
    outcome: nix::Result<T>,
    expected: Errno,
) -> std::result::Result<(), Failure> {
    match outcome {
        Ok(_) => Err(Failure::unexpected_success(op, expected)),
        Err(actual) if actual == expected => Ok(()),
        Err(actual) => Err(Failure::wrong_errno(op, expected, actual)),
    }
}

/// Pass on any failure; `expected` only names what a compliant sandbox reports.
pub fn expect_denied<T>(
    op: &str,
    outcome: nix::Result<T>,
    expected: Errno,
) -> std::result::Result<(), Failure> {
    match outcome {
        Ok(_) => Err(Failure::unexpected_success(op, expected)),
        Err(actual) => {
            if actual != expected {
                tracing::debug!(op, %actual, "denied with a different code");
            }
            Ok(())
        }
    }
}

/// Map a std io outcome onto errno semantics.
pub fn io_outcome<T>(outcome: std::io::Result<T>) -> nix::Result<T> {
    outcome.map_err(|e| e.raw_os_error().map_or(Errno::UnknownErrno, Errno::from_raw))
}

pub(crate) fn path_to_cstring(path: &Path) -> Result<CString> {
    CString::new(path.as_os_str().as_bytes()).map_err(|e| SandprobeError::InvalidPath {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}
