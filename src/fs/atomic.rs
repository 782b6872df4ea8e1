//! Exclusive, all-or-nothing file publication.
//!
//! A marker must never be observable in a created-but-not-yet-written state:
//! a concurrent starter reading an empty marker would judge it stale and
//! delete it. Publication therefore follows this pattern:
//! 1. Write content to a uniquely named temporary file in the same directory
//! 2. Sync the file to disk (fsync)
//! 3. Hard-link it to the target name, which fails if the target exists
//! 4. Remove the temporary name
//!
//! Step 3 is the exclusive-create point: of any number of concurrent
//! publishers, exactly one link succeeds and the target always carries
//! complete content.
//!
//! # Important Notes
//!
//! - Filesystems without hard links (FAT, exFAT, some network shares) fall
//!   back to `create_new` plus a direct write. There the target is briefly
//!   empty before the content lands
//! - On crash between steps 1 and 4, a temporary file may remain
//!   (named `.{filename}.{pid}-{seq}.tmp`); it is never mistaken for a marker

use crate::error::{GuardError, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Per-process sequence so concurrent publishers never share a temp file.
static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Publish `content` at `path` unless something already exists there.
///
/// # Returns
///
/// * `Ok(true)` - The file was created with the full content
/// * `Ok(false)` - The target already existed; nothing was changed
/// * `Err(GuardError::MarkerCreateFailed)` - Any other I/O failure
pub fn publish_exclusive<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<bool> {
    let path = path.as_ref();
    let temp_path = generate_temp_path(path)?;

    write_and_sync(&temp_path, content)?;

    let published = match fs::hard_link(&temp_path, path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
        // vfat reports EPERM for link(2), Windows FAT volumes report unsupported.
        Err(e) if matches!(e.kind(), ErrorKind::Unsupported | ErrorKind::PermissionDenied) => {
            create_new_and_write(path, content)
        }
        Err(e) => Err(GuardError::MarkerCreateFailed(format!(
            "failed to publish '{}': {}",
            path.display(),
            e
        ))),
    };

    // The target keeps its own link; the temp name is no longer needed.
    let _ = fs::remove_file(&temp_path);

    published
}

/// Exclusive create followed by a direct write, for filesystems without hard links.
fn create_new_and_write(path: &Path, content: &[u8]) -> Result<bool> {
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => {
            return Err(GuardError::MarkerCreateFailed(format!(
                "failed to create '{}': {}",
                path.display(),
                e
            )));
        }
    };

    file.write_all(content)
        .and_then(|()| file.sync_all())
        .map_err(|e| {
            let _ = fs::remove_file(path);
            GuardError::MarkerCreateFailed(format!("failed to write '{}': {}", path.display(), e))
        })?;

    Ok(true)
}

/// Generate a temporary file path in the same directory as the target.
fn generate_temp_path(target: &Path) -> Result<PathBuf> {
    let parent = target.parent().unwrap_or(Path::new("."));
    let filename = target
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| GuardError::MarkerCreateFailed("invalid marker path".to_string()))?;

    let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
    let temp_name = format!(".{}.{}-{}.tmp", filename, std::process::id(), seq);
    Ok(parent.join(temp_name))
}

/// Write content to a fresh file and sync to disk.
fn write_and_sync(path: &Path, content: &[u8]) -> Result<()> {
    let mut file = File::create(path).map_err(|e| {
        GuardError::MarkerCreateFailed(format!(
            "failed to create temporary file '{}': {}",
            path.display(),
            e
        ))
    })?;

    file.write_all(content).map_err(|e| {
        let _ = fs::remove_file(path);
        GuardError::MarkerCreateFailed(format!("failed to write temporary file: {}", e))
    })?;

    file.sync_all().map_err(|e| {
        let _ = fs::remove_file(path);
        GuardError::MarkerCreateFailed(format!("failed to sync temporary file to disk: {}", e))
    })?;

    Ok(())
}
