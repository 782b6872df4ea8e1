//! Marker file creation, validation, and removal.

use super::types::{MarkerInfo, MarkerStatus};
use crate::config::GuardConfig;
use crate::context::GuardContext;
use crate::error::{GuardError, Result};
use crate::fs::publish_exclusive;
use crate::process::{ProcessTable, image_matches};
use chrono::{DateTime, Utc};
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Read};
use std::path::Path;
use tracing::{debug, warn};

/// Maximum number of bytes read from a marker.
///
/// Wide enough for any decimal `u32`. Longer content is truncated before
/// parsing, which in practice makes the marker corrupt.
pub const MARKER_READ_LIMIT: usize = 10;

/// Read the process identifier recorded in a marker.
///
/// Returns `None` if the marker cannot be read or does not hold a decimal
/// identifier within [`MARKER_READ_LIMIT`] bytes.
pub fn read_recorded_pid(path: &Path) -> Option<u32> {
    let mut buf = Vec::with_capacity(MARKER_READ_LIMIT);
    let file = File::open(path).ok()?;
    file.take(MARKER_READ_LIMIT as u64)
        .read_to_end(&mut buf)
        .ok()?;

    std::str::from_utf8(&buf).ok()?.trim().parse::<u32>().ok()
}

/// Classify an existing marker against the live process table.
pub fn classify(
    ctx: &GuardContext,
    config: &GuardConfig,
    table: &dyn ProcessTable,
) -> (Option<u32>, MarkerStatus) {
    let Some(pid) = read_recorded_pid(&ctx.marker_path) else {
        return (None, MarkerStatus::Corrupt);
    };

    let live = match table.live_pids() {
        Ok(pids) => pids,
        Err(e) => {
            warn!(error = %e, "instance_guard.process_table_unavailable");
            return (Some(pid), MarkerStatus::Stale);
        }
    };
    if !live.contains(&pid) {
        return (Some(pid), MarkerStatus::Stale);
    }

    match table.image_name(pid) {
        Some(image) if image_matches(&image, &ctx.app_name, &config.host_runtimes) => {
            (Some(pid), MarkerStatus::Live)
        }
        image => {
            debug!(pid, image = ?image, "instance_guard.image_mismatch");
            (Some(pid), MarkerStatus::Stale)
        }
    }
}

/// Opens the published marker and returns the ownership handle.
pub(crate) type MarkerOpener = fn(&Path) -> io::Result<File>;

/// Whether anything, including a dangling symlink, occupies the marker path.
pub fn marker_present(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Create the marker with the current process identifier.
///
/// `open` turns the published marker into the ownership handle; the guard
/// passes [`open_ownership_handle`].
///
/// # Returns
///
/// * `Ok(Some(File))` - Marker created; the read-only handle is the ownership token
/// * `Ok(None)` - Another starter created the marker first
/// * `Err(GuardError::MarkerCreateFailed)` - I/O failure; no marker left behind
pub(crate) fn create(ctx: &GuardContext, open: MarkerOpener) -> Result<Option<File>> {
    let pid = std::process::id().to_string();

    if !publish_exclusive(&ctx.marker_path, pid.as_bytes())? {
        return Ok(None);
    }

    match open(&ctx.marker_path) {
        Ok(handle) => Ok(Some(handle)),
        Err(e) => {
            let _ = fs::remove_file(&ctx.marker_path);
            Err(GuardError::MarkerCreateFailed(format!(
                "failed to reopen '{}' read-only: {}",
                ctx.marker_path.display(),
                e
            )))
        }
    }
}

/// Open the marker read-only, sharing it for reading only where supported.
#[cfg(windows)]
pub(crate) fn open_ownership_handle(path: &Path) -> io::Result<File> {
    use std::os::windows::fs::OpenOptionsExt;

    const FILE_SHARE_READ: u32 = 0x1;
    OpenOptions::new()
        .read(true)
        .share_mode(FILE_SHARE_READ)
        .open(path)
}

#[cfg(not(windows))]
pub(crate) fn open_ownership_handle(path: &Path) -> io::Result<File> {
    OpenOptions::new().read(true).open(path)
}

/// Whether the file at `path` is the one `handle` was opened on.
///
/// A marker replaced behind the owner's back (deleted externally, then
/// recreated by another starter) is a different file and must not be
/// removed by the old owner.
#[cfg(unix)]
pub fn still_owned(handle: &File, path: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    match (handle.metadata(), fs::symlink_metadata(path)) {
        (Ok(held), Ok(current)) => held.dev() == current.dev() && held.ino() == current.ino(),
        _ => false,
    }
}

/// Whether the file at `path` is the one `handle` was opened on.
///
/// Without stable file indices, creation and write times identify the file.
/// Creation time alone is not enough: NTFS hands a recently deleted name's
/// creation time to a file recreated under that name.
#[cfg(not(unix))]
pub fn still_owned(handle: &File, path: &Path) -> bool {
    let (Ok(held), Ok(current)) = (handle.metadata(), fs::symlink_metadata(path)) else {
        return false;
    };
    match (
        held.created(),
        current.created(),
        held.modified(),
        current.modified(),
    ) {
        (Ok(c1), Ok(c2), Ok(m1), Ok(m2)) => c1 == c2 && m1 == m2 && held.len() == current.len(),
        _ => false,
    }
}

/// Remove a stale marker. A marker that is already gone is not an error.
pub fn remove_stale(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(GuardError::MarkerDeleteFailed(format!(
            "'{}': {}",
            path.display(),
            e
        ))),
    }
}

/// Describe the marker for an application without acquiring it.
///
/// # Returns
///
/// * `Ok(Some(MarkerInfo))` - A marker exists
/// * `Ok(None)` - No marker exists
/// * `Err(GuardError)` - Invalid name or missing data root
pub fn inspect_marker(
    app_name: &str,
    config: &GuardConfig,
    table: &dyn ProcessTable,
) -> Result<Option<MarkerInfo>> {
    let ctx = GuardContext::resolve(app_name, config)?;

    let metadata = match fs::symlink_metadata(&ctx.marker_path) {
        Ok(metadata) => metadata,
        Err(_) => return Ok(None),
    };
    let modified_at = metadata.modified().ok().map(DateTime::<Utc>::from);
    let (pid, status) = classify(&ctx, config, table);

    Ok(Some(MarkerInfo {
        path: ctx.marker_path,
        app_name: ctx.app_name,
        pid,
        status,
        modified_at,
    }))
}
