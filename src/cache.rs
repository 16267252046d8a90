//! On-disk palette artifacts.
//!
//! A missing, unreadable or malformed artifact is reported as `None` from
//! [`load`] so the caller recomputes instead of failing on a stale file.

use std::fs;
use std::path::Path;

use crate::error::PaletteError;
use crate::select::PaletteResult;

/// Owner read/write/execute.
const OWNER_RWX: u32 = 0o700;

/// Load a previously stored palette, if a valid one exists at `path`.
pub fn load(path: &Path) -> Option<PaletteResult> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::trace!(path = %path.display(), error = %e, "No cached palette");
            return None;
        }
    };

    match serde_json::from_slice::<PaletteResult>(&bytes) {
        Ok(result) => Some(result),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Ignoring malformed palette cache");
            None
        }
    }
}

/// Persist `result` at `path`, creating the parent directory if needed.
///
/// The artifact is read back after writing; success means it is readable.
pub fn store(path: &Path, result: &PaletteResult) -> Result<(), PaletteError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        ensure_writable_directory(dir)?;
    }

    let data = serde_json::to_vec(result).map_err(|e| {
        PaletteError::io(
            format!("Couldn't encode palette for {}", path.display()),
            e.into(),
        )
    })?;
    fs::write(path, &data).map_err(|e| {
        PaletteError::io(format!("Couldn't write palette to {}", path.display()), e)
    })?;

    let written = fs::read(path).map_err(|e| {
        PaletteError::io(
            format!("Saved palette is not readable: {}", path.display()),
            e,
        )
    })?;
    if written != data {
        return Err(PaletteError::io_gate(format!(
            "Saved palette does not match what was written: {}",
            path.display()
        )));
    }

    tracing::info!(path = %path.display(), colors = result.len(), "Saved palette");
    Ok(())
}

/// Make sure `dir` exists and this process can write into it.
///
/// Creates missing directories (and ancestors) with owner rwx, and grants owner
/// rwx once to an existing directory that is not writable. A directory owned by
/// someone else cannot be chmodded, so it fails at the grant.
pub fn ensure_writable_directory(dir: &Path) -> Result<(), PaletteError> {
    if !dir.is_dir() {
        if let Err(e) = create_dir_all_owner_only(dir) {
            if !dir.is_dir() {
                return Err(PaletteError::io(
                    format!("Couldn't create missing destination dir: {}", dir.display()),
                    e,
                ));
            }
        } else {
            tracing::debug!(dir = %dir.display(), "Created destination dir");
        }
    }

    if is_writable(dir) {
        return Ok(());
    }

    tracing::debug!(dir = %dir.display(), "Granting owner write permission");
    grant_owner_rwx(dir).map_err(|e| {
        PaletteError::io(
            format!("Destination directory not writable: {}", dir.display()),
            e,
        )
    })?;

    if !is_writable(dir) {
        return Err(PaletteError::io_gate(format!(
            "Destination directory not writable: {}",
            dir.display()
        )));
    }
    Ok(())
}

#[cfg(unix)]
fn create_dir_all_owner_only(dir: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;

    fs::DirBuilder::new()
        .recursive(true)
        .mode(OWNER_RWX)
        .create(dir)
}

#[cfg(not(unix))]
fn create_dir_all_owner_only(dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dir)
}

/// Whether this process may create files in `dir`, judged by the kernel
/// (ownership, group and ACLs included) rather than by the mode bits alone.
#[cfg(unix)]
fn is_writable(dir: &Path) -> bool {
    rustix::fs::access(dir, rustix::fs::Access::WRITE_OK).is_ok()
}

#[cfg(not(unix))]
fn is_writable(dir: &Path) -> bool {
    fs::metadata(dir)
        .map(|m| !m.permissions().readonly())
        .unwrap_or(false)
}

#[cfg(unix)]
fn grant_owner_rwx(dir: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = fs::metadata(dir)?.permissions();
    perms.set_mode(perms.mode() | OWNER_RWX);
    fs::set_permissions(dir, perms)
}

#[cfg(not(unix))]
fn grant_owner_rwx(dir: &Path) -> std::io::Result<()> {
    let mut perms = fs::metadata(dir)?.permissions();
    perms.set_readonly(false);
    fs::set_permissions(dir, perms)
}
