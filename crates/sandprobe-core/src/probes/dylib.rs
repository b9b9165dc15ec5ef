//! Shared library loading through the sandbox's loader

use super::path_to_cstring;
use crate::{Failure, JailConfig, Result, SandprobeError, Verdict};
use std::ffi::{CStr, CString, c_void};
use std::ptr::NonNull;

/// A `dlopen` handle, closed on drop
#[derive(Debug)]
pub struct Library {
    handle: NonNull<c_void>,
}

impl Library {
    /// Load with lazy binding. The error is the loader's own diagnostic.
    pub fn open(name: &CStr) -> std::result::Result<Self, String> {
        // SAFETY: name is NUL-terminated; the handle is owned by the returned value
        let handle = unsafe { libc::dlopen(name.as_ptr(), libc::RTLD_LAZY) };

        NonNull::new(handle)
            .map(|handle| Self { handle })
            .ok_or_else(last_loader_error)
    }
}

impl Drop for Library {
    fn drop(&mut self) {
        // SAFETY: handle came from a successful dlopen and is closed exactly once
        unsafe {
            libc::dlclose(self.handle.as_ptr());
        }
    }
}

fn last_loader_error() -> String {
    // SAFETY: dlerror returns null or a string valid until the next loader call
    let msg = unsafe { libc::dlerror() };
    if msg.is_null() {
        return "unknown loader error".into();
    }
    unsafe { CStr::from_ptr(msg) }.to_string_lossy().into_owned()
}

fn load(name: &CStr) -> std::result::Result<(), Failure> {
    let library = Library::open(name)
        .map_err(|e| Failure::operation_failed(format!("dlopen failed with: {e}")))?;
    tracing::debug!(name = ?name, "library loaded");
    drop(library);
    Ok(())
}

/// Load by absolute path inside the sandbox
pub fn dlopen_path(config: &JailConfig) -> Result<Verdict> {
    let path = path_to_cstring(&config.library_path)?;
    Ok(load(&path).into())
}

/// Load by bare name, resolved through the search path
pub fn dlopen_name(config: &JailConfig) -> Result<Verdict> {
    let name = CString::new(config.library_name.as_str()).map_err(|e| {
        SandprobeError::InvalidPath {
            path: config.library_name.clone(),
            reason: e.to_string(),
        }
    })?;
    Ok(load(&name).into())
}
