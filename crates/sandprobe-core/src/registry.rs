//! Ordered probe registry

use crate::probes::{clock, dylib, filesystem, process, syscall};
use crate::{JailConfig, Result, Verdict};
use std::fmt;

/// Callable behind a probe
pub type ProbeFn = Box<dyn Fn(&JailConfig) -> Result<Verdict>>;

/// A named compliance check
pub struct Probe {
    name: String,
    check: ProbeFn,
}

impl Probe {
    pub fn new(
        name: impl Into<String>,
        check: impl Fn(&JailConfig) -> Result<Verdict> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            check: Box::new(check),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the check once. Errors and panics are handled by the runner.
    pub fn check(&self, config: &JailConfig) -> Result<Verdict> {
        (self.check)(config)
    }
}

impl fmt::Debug for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Probe").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Probes in execution order
#[derive(Debug, Default)]
pub struct Registry {
    probes: Vec<Probe>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The nine checks every compliant sandbox must pass
    #[must_use]
    pub fn reference(config: &JailConfig) -> Self {
        let mut registry = Self::new();
        registry
            .register(
                format!("filesystem_jail({})", config.virtual_root.display()),
                filesystem::jail,
            )
            .register("no_fork()", process::no_fork)
            .register("missing_syscall(kill(0, 0))", syscall::no_kill)
            .register("missing_syscall(waitpid(0), wait4(0))", syscall::no_wait)
            .register(
                format!("missing_syscall(umount({}))", config.unmount_target.display()),
                syscall::no_umount,
            )
            .register("missing_syscall(pipe())", syscall::no_pipe)
            .register(
                format!("dlopen({})", config.library_path.display()),
                dylib::dlopen_path,
            )
            .register(format!("dlopen({})", config.library_name), dylib::dlopen_name)
            .register(
                format!(
                    "no_chmod({}, {:04o})",
                    config.chmod_target.display(),
                    config.chmod_mode
                ),
                syscall::no_chmod,
            );
        registry
    }

    /// Reference checks followed by the wider environment checks
    #[must_use]
    pub fn extended(config: &JailConfig) -> Self {
        let mut registry = Self::reference(config);
        registry
            .register(
                "missing_syscall(socket(AF_INET, SOCK_STREAM))",
                syscall::no_socket,
            )
            .register(
                format!("no_spawn({} -l)", process::SPAWN_PROGRAM),
                process::no_spawn,
            )
            .register(
                format!("root_listing({})", config.listing_root.display()),
                filesystem::root_listing,
            )
            .register(
                format!("hidden_file({})", config.hidden_file.display()),
                filesystem::hidden_file,
            )
            .register(
                format!(
                    "readable_file({})",
                    config.virtual_root.join(&config.readable_file).display()
                ),
                filesystem::readable_file,
            )
            .register(
                format!("scratch_write({})", config.scratch_file.display()),
                filesystem::scratch_write,
            )
            .register("clock_sanity()", clock::clock_sanity);
        registry
    }

    /// Append a probe; it runs after everything registered so far
    pub fn register(
        &mut self,
        name: impl Into<String>,
        check: impl Fn(&JailConfig) -> Result<Verdict> + 'static,
    ) -> &mut Self {
        self.probes.push(Probe::new(name, check));
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.probes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Probe> {
        self.probes.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.probes.iter().map(Probe::name)
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = &'a Probe;
    type IntoIter = std::slice::Iter<'a, Probe>;

    fn into_iter(self) -> Self::IntoIter {
        self.probes.iter()
    }
}
