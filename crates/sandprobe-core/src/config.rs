//! Expected sandbox layout

use crate::{Result, SandprobeError};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// What the sandbox under test is expected to look like from inside.
///
/// None of these paths are created by the harness. They are supplied by the
/// environment and only observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JailConfig {
    /// Root of the sandbox-presented tree
    pub virtual_root: PathBuf,

    /// Directories that must exist under `virtual_root`
    pub required_subdirs: Vec<PathBuf>,

    /// Directory listed when looking for forbidden entries
    pub listing_root: PathBuf,

    /// Entries of `listing_root` that must not be visible
    pub forbidden_entries: Vec<String>,

    /// Path the unmount probe targets
    pub unmount_target: PathBuf,

    /// Path the permission-change probe targets
    pub chmod_target: PathBuf,

    /// Mode bits requested by the permission-change probe
    pub chmod_mode: u32,

    /// Shared library loaded by absolute path
    pub library_path: PathBuf,

    /// Same library, loaded through the search path
    pub library_name: String,

    /// Entries of `listing_root` required by the extended listing probe
    pub root_entries: Vec<String>,

    /// Entries of `listing_root` rejected by the extended listing probe
    pub hidden_root_entries: Vec<String>,

    /// Host file that must not be reachable
    pub hidden_file: PathBuf,

    /// File under `virtual_root` that must be readable
    pub readable_file: PathBuf,

    /// File created and removed by the scratch-write probe
    pub scratch_file: PathBuf,
}

impl Default for JailConfig {
    fn default() -> Self {
        Self {
            virtual_root: PathBuf::from("/python"),
            required_subdirs: vec![PathBuf::from("bin"), PathBuf::from("lib")],
            listing_root: PathBuf::from("/"),
            forbidden_entries: vec!["home".into()],
            unmount_target: PathBuf::from("/python/bin"),
            chmod_target: PathBuf::from("/python/bin"),
            chmod_mode: 0o777,
            library_path: PathBuf::from("/slib/libz.so.1"),
            library_name: "libz.so.1".into(),
            root_entries: vec!["lib".into(), "python".into()],
            hidden_root_entries: vec!["usr".into(), "etc".into()],
            hidden_file: PathBuf::from("/etc/passwd"),
            readable_file: PathBuf::from("lib/python2.7/os.py"),
            scratch_file: PathBuf::from("/tmpfile.deleteme"),
        }
    }
}

impl JailConfig {
    /// Create a new config builder
    #[must_use]
    pub fn builder() -> JailConfigBuilder {
        JailConfigBuilder::default()
    }

    /// Reject layouts the probes cannot interpret unambiguously.
    pub fn validate(&self) -> Result<()> {
        if !self.virtual_root.is_absolute() {
            return Err(SandprobeError::Config(format!(
                "virtual root must be absolute: {}",
                self.virtual_root.display()
            )));
        }

        if let Some(dir) = self.required_subdirs.iter().find(|d| d.is_absolute()) {
            return Err(SandprobeError::Config(format!(
                "required subdirectory must be relative to the virtual root: {}",
                dir.display()
            )));
        }

        if self.readable_file.is_absolute() {
            return Err(SandprobeError::Config(format!(
                "readable file must be relative to the virtual root: {}",
                self.readable_file.display()
            )));
        }

        if !self.library_path.is_absolute() {
            return Err(SandprobeError::Config(format!(
                "library path must be absolute: {}",
                self.library_path.display()
            )));
        }

        // A slash makes the loader skip the search path entirely
        if self.library_name.is_empty() || self.library_name.contains('/') {
            return Err(SandprobeError::Config(format!(
                "library name must be a bare file name: {:?}",
                self.library_name
            )));
        }

        if self.chmod_mode > 0o7777 {
            return Err(SandprobeError::Config(format!(
                "invalid mode {:o}",
                self.chmod_mode
            )));
        }

        Ok(())
    }
}

/// Builder for JailConfig
#[derive(Debug, Default)]
pub struct JailConfigBuilder {
    config: JailConfig,
}

impl JailConfigBuilder {
    #[must_use]
    pub fn virtual_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.virtual_root = path.into();
        self
    }

    /// Replace the required subdirectories
    #[must_use]
    pub fn required_subdirs<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.config.required_subdirs = dirs.into_iter().map(Into::into).collect();
        self
    }

    /// Move the virtual root, along with everything derived from it: the
    /// unmount and permission-change targets become `<root>/bin`, and the
    /// root's top-level entry replaces the old one in `root_entries`.
    #[must_use]
    pub fn rooted_at(mut self, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let bin = root.join("bin");

        let old_entry = top_level_entry(&self.config.virtual_root);
        let new_entry = top_level_entry(&root);
        let mut entries: Vec<String> = self
            .config
            .root_entries
            .iter()
            .filter(|e| Some(e.as_str()) != old_entry.as_deref())
            .cloned()
            .collect();
        if let Some(entry) = new_entry.filter(|e| !entries.contains(e)) {
            entries.push(entry);
        }

        self.virtual_root(root)
            .unmount_target(&bin)
            .chmod_target(bin)
            .root_entries(entries)
    }

    #[must_use]
    pub fn listing_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.listing_root = path.into();
        self
    }

    /// Replace the forbidden entries
    #[must_use]
    pub fn forbidden_entries<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.forbidden_entries = names.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn unmount_target(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.unmount_target = path.into();
        self
    }

    #[must_use]
    pub fn chmod_target(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.chmod_target = path.into();
        self
    }

    #[must_use]
    pub fn chmod_mode(mut self, mode: u32) -> Self {
        self.config.chmod_mode = mode;
        self
    }

    #[must_use]
    pub fn library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.library_path = path.into();
        self
    }

    #[must_use]
    pub fn library_name(mut self, name: impl Into<String>) -> Self {
        self.config.library_name = name.into();
        self
    }

    #[must_use]
    pub fn root_entries<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.root_entries = names.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn hidden_root_entries<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.hidden_root_entries = names.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn hidden_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.hidden_file = path.into();
        self
    }

    #[must_use]
    pub fn readable_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.readable_file = path.into();
        self
    }

    #[must_use]
    pub fn scratch_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.scratch_file = path.into();
        self
    }

    #[must_use]
    pub fn build(self) -> JailConfig {
        self.config
    }
}

/// First named component of an absolute path, as it appears in a listing of `/`
fn top_level_entry(path: &Path) -> Option<String> {
    path.components().find_map(|c| match c {
        Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
        _ => None,
    })
}
