//! Syscalls the sandbox must refuse
//!
//! Removed syscalls must fail with `ENOSYS`. The permission change is the
//! exception: the call exists but policy refuses it with `EACCES`.

use super::{REFUSED, REMOVED, expect_errno, path_to_cstring};
use crate::{JailConfig, Result, Verdict};
use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::sys::socket::{AddressFamily, SockFlag, SockType, socket};
use nix::sys::wait::waitpid;
use nix::unistd::{Pid, pipe};

/// Null signal to our own process group
pub fn no_kill(_config: &JailConfig) -> Result<Verdict> {
    Ok(expect_errno("kill", kill(Pid::from_raw(0), None::<Signal>), REMOVED).into())
}

/// Both wait primitives, first mismatch wins
pub fn no_wait(_config: &JailConfig) -> Result<Verdict> {
    let outcome = expect_errno("waitpid", waitpid(Pid::from_raw(0), None), REMOVED)
        .and_then(|()| expect_errno("wait4", wait4_any(), REMOVED));
    Ok(outcome.into())
}

pub fn no_umount(config: &JailConfig) -> Result<Verdict> {
    let target = config.unmount_target.as_path();
    let outcome = nix::mount::umount(target);
    Ok(expect_errno("umount", outcome, REMOVED).into())
}

pub fn no_pipe(_config: &JailConfig) -> Result<Verdict> {
    // Both ends drop here if the sandbox lets the call through
    let outcome = pipe().map(drop);
    Ok(expect_errno("pipe", outcome, REMOVED).into())
}

pub fn no_socket(_config: &JailConfig) -> Result<Verdict> {
    let outcome = socket(
        AddressFamily::Inet,
        SockType::Stream,
        SockFlag::SOCK_CLOEXEC,
        None,
    )
    .map(drop);
    Ok(expect_errno("socket", outcome, REMOVED).into())
}

/// Permission bits on a sandbox-owned directory must be refused, not missing
pub fn no_chmod(config: &JailConfig) -> Result<Verdict> {
    let path = path_to_cstring(&config.chmod_target)?;

    // SAFETY: path is a valid NUL-terminated string for the duration of the call
    let ret = unsafe { libc::chmod(path.as_ptr(), config.chmod_mode as libc::mode_t) };

    Ok(expect_errno("chmod", Errno::result(ret), REFUSED).into())
}

fn wait4_any() -> nix::Result<libc::pid_t> {
    let mut status: libc::c_int = 0;

    // SAFETY: status outlives the call and a null rusage is permitted
    let ret = unsafe { libc::wait4(0, &raw mut status, 0, std::ptr::null_mut()) };

    Errno::result(ret)
}
