//! Path resolution for an instance guard.
//!
//! Every path a guard touches is derived here exactly once, at construction,
//! so a guard behaves consistently even if the environment changes while the
//! application runs.

use crate::config::GuardConfig;
use crate::error::{GuardError, Result};
use std::fs;
use std::path::PathBuf;

/// Extension of the marker file.
pub const MARKER_EXTENSION: &str = "pid";

/// Resolved paths for one application's marker.
///
/// All paths are derived from the data root; none are re-read from the
/// environment after construction.
#[derive(Debug, Clone)]
pub struct GuardContext {
    /// The validated application name.
    pub app_name: String,

    /// The user data root (e.g. `%APPDATA%`).
    pub data_root: PathBuf,

    /// Directory holding the marker: `{data_root}/{app_name}/`.
    pub marker_dir: PathBuf,

    /// The marker file: `{data_root}/{app_name}/{app_name}.pid`.
    pub marker_path: PathBuf,
}

impl GuardContext {
    /// Validate the application name and derive the marker paths.
    ///
    /// The name is checked before the data root is resolved, so an invalid
    /// name never leads to any filesystem access.
    ///
    /// # Returns
    ///
    /// * `Ok(GuardContext)` - Successfully resolved context
    /// * `Err(GuardError::InvalidName)` - Empty name or name with a path separator
    /// * `Err(GuardError::FileSystemUnavailable)` - Data root missing
    pub fn resolve(app_name: &str, config: &GuardConfig) -> Result<Self> {
        validate_app_name(app_name)?;

        let data_root = config.resolve_data_root()?;
        let marker_dir = data_root.join(app_name);
        let marker_path = marker_dir.join(format!("{}.{}", app_name, MARKER_EXTENSION));

        Ok(Self {
            app_name: app_name.to_string(),
            data_root,
            marker_dir,
            marker_path,
        })
    }

    /// Create the marker directory if it doesn't exist.
    pub fn ensure_marker_dir(&self) -> Result<()> {
        if self.marker_dir.is_dir() {
            return Ok(());
        }

        fs::create_dir_all(&self.marker_dir).map_err(|e| {
            GuardError::FileSystemUnavailable(format!(
                "failed to create marker directory '{}': {}",
                self.marker_dir.display(),
                e
            ))
        })
    }
}

/// Check that an application name is usable as a single path component.
///
/// Both `/` and `\` are rejected on every platform, as are `.` and `..`,
/// which would otherwise place the marker outside its own directory.
pub fn validate_app_name(app_name: &str) -> Result<()> {
    let invalid = app_name.is_empty()
        || app_name.contains(['/', '\\'])
        || app_name.contains('\0')
        || app_name == "."
        || app_name == "..";

    if invalid {
        return Err(GuardError::InvalidName(app_name.to_string()));
    }
    Ok(())
}
