//! Guard configuration.
//!
//! There is no configuration file: callers build a [`GuardConfig`] in code,
//! or take the defaults. Environment-derived values (the user data root) are
//! resolved once, when a guard is constructed.

use crate::error::{GuardError, Result};
use std::path::PathBuf;

/// Image name substring identifying the generic runtime that hosts
/// interpreted applications (the launched script's own name never shows up
/// as the process image).
pub const DEFAULT_HOST_RUNTIME: &str = "python";

/// Configuration for an instance guard.
#[derive(Debug, Clone)]
pub struct GuardConfig {
    /// Root under which the `<app>/<app>.pid` marker lives.
    ///
    /// `None` resolves to the platform user data directory
    /// (`%APPDATA%` on Windows, `$XDG_DATA_HOME` or `~/.local/share` on Linux).
    pub data_root: Option<PathBuf>,

    /// Image name substrings that mark a process as a generic host runtime.
    ///
    /// A live process whose image name contains one of these is accepted as
    /// the marker owner even when its image does not contain the application
    /// name. Empty entries are ignored.
    pub host_runtimes: Vec<String>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            data_root: None,
            host_runtimes: vec![DEFAULT_HOST_RUNTIME.to_string()],
        }
    }
}

impl GuardConfig {
    /// Use an explicit data root instead of the platform user data directory.
    pub fn with_data_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.data_root = Some(root.into());
        self
    }

    /// Replace the list of accepted host runtime image names.
    pub fn with_host_runtimes<I, S>(mut self, runtimes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.host_runtimes = runtimes.into_iter().map(Into::into).collect();
        self
    }

    /// Resolve the data root and check that it is an existing directory.
    ///
    /// # Returns
    ///
    /// * `Ok(PathBuf)` - The resolved root
    /// * `Err(GuardError::FileSystemUnavailable)` - No user data directory is
    ///   known for this platform, or the root does not exist
    pub fn resolve_data_root(&self) -> Result<PathBuf> {
        let root = match &self.data_root {
            Some(root) => root.clone(),
            None => dirs::data_dir().ok_or_else(|| {
                GuardError::FileSystemUnavailable(
                    "no user data directory is defined for this platform".to_string(),
                )
            })?,
        };

        if !root.is_dir() {
            return Err(GuardError::FileSystemUnavailable(format!(
                "data root '{}' does not exist or is not a directory",
                root.display()
            )));
        }

        Ok(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[cfg(target_os = "linux")]
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn default_config_uses_platform_root_and_python_runtime() {
        let config = GuardConfig::default();
        assert!(config.data_root.is_none());
        assert_eq!(config.host_runtimes, vec!["python".to_string()]);
    }

    #[test]
    fn builder_methods_override_defaults() {
        let config = GuardConfig::default()
            .with_data_root("/tmp/somewhere")
            .with_host_runtimes(["node", "java"]);

        assert_eq!(config.data_root, Some(PathBuf::from("/tmp/somewhere")));
        assert_eq!(config.host_runtimes, vec!["node", "java"]);
    }

    #[test]
    fn explicit_root_resolves_when_present() {
        let temp_dir = TempDir::new().unwrap();
        let config = GuardConfig::default().with_data_root(temp_dir.path());

        assert_eq!(config.resolve_data_root().unwrap(), temp_dir.path());
    }

    #[test]
    fn missing_root_is_filesystem_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        let config = GuardConfig::default().with_data_root(temp_dir.path().join("missing"));

        let err = config.resolve_data_root().unwrap_err();
        assert!(matches!(err, GuardError::FileSystemUnavailable(_)));
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn file_as_root_is_filesystem_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("not-a-dir");
        std::fs::write(&file, "x").unwrap();

        let config = GuardConfig::default().with_data_root(&file);
        assert!(matches!(
            config.resolve_data_root(),
            Err(GuardError::FileSystemUnavailable(_))
        ));
    }

    #[cfg(target_os = "linux")]
    #[test]
    #[serial]
    fn platform_root_follows_xdg_data_home() {
        let temp_dir = TempDir::new().unwrap();
        let previous = std::env::var_os("XDG_DATA_HOME");

        // SAFETY: serialized with every other test touching the environment.
        unsafe { std::env::set_var("XDG_DATA_HOME", temp_dir.path()) };
        let resolved = GuardConfig::default().resolve_data_root();
        match previous {
            Some(value) => unsafe { std::env::set_var("XDG_DATA_HOME", value) },
            None => unsafe { std::env::remove_var("XDG_DATA_HOME") },
        }

        assert_eq!(resolved.unwrap(), temp_dir.path());
    }
}
