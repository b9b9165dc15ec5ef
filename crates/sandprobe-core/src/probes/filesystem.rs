//! Filesystem jail checks

use super::{expect_errno, io_outcome};
use crate::{Failure, JailConfig, Result, Verdict};
use nix::errno::Errno;
use std::fs;
use std::io::Read;
use std::path::Path;

type Outcome = std::result::Result<(), Failure>;

/// Payload written and read back by `scratch_write`
const SCRATCH_PAYLOAD: &[u8] = b"hello\n";

/// Bytes `readable_file` reads from the start of the file
const READ_PREFIX: usize = 1024;

/// The virtual root and its subdirectories exist, and no forbidden host
/// entry shows up in the root listing.
pub fn jail(config: &JailConfig) -> Result<Verdict> {
    Ok(check_jail(config).into())
}

fn check_jail(config: &JailConfig) -> Outcome {
    require_dir(&config.virtual_root)?;
    for subdir in &config.required_subdirs {
        require_dir(&config.virtual_root.join(subdir))?;
    }

    let names = list(&config.listing_root)?;
    reject_entries(&config.listing_root, &names, &config.forbidden_entries)
}

/// Wider look at the root listing: required entries present, host entries absent
pub fn root_listing(config: &JailConfig) -> Result<Verdict> {
    let outcome = list(&config.listing_root).and_then(|names| {
        if let Some(missing) = config.root_entries.iter().find(|e| !names.contains(*e)) {
            return Err(Failure::layout(format!(
                "missing entry {}",
                config.listing_root.join(missing).display()
            )));
        }
        reject_entries(&config.listing_root, &names, &config.hidden_root_entries)
    });
    Ok(outcome.into())
}

/// A host file must look absent, not merely unreadable
pub fn hidden_file(config: &JailConfig) -> Result<Verdict> {
    let opened = io_outcome(fs::File::open(&config.hidden_file)).map(drop);
    let op = format!("open {}", config.hidden_file.display());
    Ok(expect_errno(&op, opened, Errno::ENOENT).into())
}

/// Files the sandbox ships under the virtual root can be read
pub fn readable_file(config: &JailConfig) -> Result<Verdict> {
    Ok(check_readable(&config.virtual_root.join(&config.readable_file)).into())
}

fn check_readable(path: &Path) -> Outcome {
    let shown = path.display();
    let mut head = Vec::with_capacity(READ_PREFIX);

    fs::File::open(path)
        .and_then(|file| file.take(READ_PREFIX as u64).read_to_end(&mut head))
        .map_err(|e| Failure::operation_failed(format!("can't read {shown}: {e}")))?;

    if head.is_empty() {
        return Err(Failure::operation_failed(format!("{shown} is empty")));
    }
    Ok(())
}

/// Files can be created, read back and removed
pub fn scratch_write(config: &JailConfig) -> Result<Verdict> {
    Ok(check_scratch_write(&config.scratch_file).into())
}

fn check_scratch_write(path: &Path) -> Outcome {
    let shown = path.display();

    if path.exists() {
        fs::remove_file(path)
            .map_err(|e| Failure::operation_failed(format!("can't remove stale {shown}: {e}")))?;
    }

    fs::write(path, SCRATCH_PAYLOAD)
        .map_err(|e| Failure::operation_failed(format!("can't write {shown}: {e}")))?;

    let read_back = fs::read(path);
    let removed = fs::remove_file(path);

    let contents =
        read_back.map_err(|e| Failure::operation_failed(format!("can't read {shown}: {e}")))?;
    if contents != SCRATCH_PAYLOAD {
        return Err(Failure::operation_failed(format!(
            "{shown} read back {} bytes, wrote {}",
            contents.len(),
            SCRATCH_PAYLOAD.len()
        )));
    }

    removed.map_err(|e| Failure::operation_failed(format!("can't remove {shown}: {e}")))?;
    if path.exists() {
        return Err(Failure::operation_failed(format!("{shown} still exists after removal")));
    }

    Ok(())
}

fn require_dir(path: &Path) -> Outcome {
    if fs::metadata(path).is_ok_and(|meta| meta.is_dir()) {
        Ok(())
    } else {
        Err(Failure::layout(format!("missing directory: {}", path.display())))
    }
}

/// Entry names of `dir`. The handle is closed before returning.
fn list(dir: &Path) -> std::result::Result<Vec<String>, Failure> {
    let entries = fs::read_dir(dir)
        .map_err(|e| Failure::layout(format!("can't open {}: {e}", dir.display())))?;

    entries
        .map(|entry| {
            entry
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .map_err(|e| Failure::layout(format!("can't list {}: {e}", dir.display())))
        })
        .collect()
}

fn reject_entries(dir: &Path, names: &[String], forbidden: &[String]) -> Outcome {
    match names.iter().find(|name| forbidden.contains(*name)) {
        Some(name) => Err(Failure::layout(format!(
            "Unexpected entry {}",
            dir.join(name).display()
        ))),
        None => Ok(()),
    }
}
