//! Live process table queries.
//!
//! Marker validation needs two things from the operating system: the set of
//! live process identifiers, and the executable image base name of a given
//! process. Both are behind the [`ProcessTable`] trait so the guard can be
//! driven by a fake table in tests.
//!
//! [`SystemProcessTable`] is the default implementation:
//! - **Linux**: `/proc/<pid>` entries; the image name comes from the
//!   `/proc/<pid>/exe` link, falling back to `/proc/<pid>/comm` when the link
//!   is not readable (processes of other users)
//! - **Windows**: `EnumProcesses`, `OpenProcess` with query-limited access,
//!   and `GetModuleBaseNameW`
//! - **Other platforms**: an empty table, so every existing marker is stale

#[cfg(target_os = "linux")]
mod linux;
#[cfg(windows)]
mod windows;

use std::fmt;
use std::io;

/// The host operating system's process-information service.
pub trait ProcessTable: fmt::Debug + Send + Sync {
    /// Identifiers of every live process.
    fn live_pids(&self) -> io::Result<Vec<u32>>;

    /// Executable image base name of `pid` (e.g. `editor.exe`), if it can be read.
    fn image_name(&self, pid: u32) -> Option<String>;
}

/// Process table backed by the running operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcessTable;

impl ProcessTable for SystemProcessTable {
    #[cfg(target_os = "linux")]
    fn live_pids(&self) -> io::Result<Vec<u32>> {
        linux::live_pids()
    }

    #[cfg(windows)]
    fn live_pids(&self) -> io::Result<Vec<u32>> {
        windows::live_pids()
    }

    #[cfg(not(any(target_os = "linux", windows)))]
    fn live_pids(&self) -> io::Result<Vec<u32>> {
        tracing::warn!("process_table.unsupported_platform");
        Ok(Vec::new())
    }

    #[cfg(target_os = "linux")]
    fn image_name(&self, pid: u32) -> Option<String> {
        linux::image_name(pid)
    }

    #[cfg(windows)]
    fn image_name(&self, pid: u32) -> Option<String> {
        windows::image_name(pid)
    }

    #[cfg(not(any(target_os = "linux", windows)))]
    fn image_name(&self, _pid: u32) -> Option<String> {
        None
    }
}

/// Decide whether a process image plausibly belongs to the application.
///
/// Case-insensitive: the image name must contain the application name, or
/// contain one of the host runtime names (for applications launched through
/// a generic interpreter). This is deliberately loose. An unrelated process
/// that reused the recorded identifier and happens to match is accepted as
/// the owner.
pub fn image_matches(image: &str, app_name: &str, host_runtimes: &[String]) -> bool {
    let image = image.to_lowercase();

    if image.contains(&app_name.to_lowercase()) {
        return true;
    }

    host_runtimes
        .iter()
        .filter(|runtime| !runtime.is_empty())
        .any(|runtime| image.contains(&runtime.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runtimes() -> Vec<String> {
        vec!["python".to_string()]
    }

    #[test]
    fn test_image_matches_app_name_case_insensitively() {
        assert!(image_matches("Editor.exe", "editor", &runtimes()));
        assert!(image_matches("editor", "EDITOR", &runtimes()));
        assert!(image_matches("my-editor-v2", "editor", &runtimes()));
    }

    #[test]
    fn test_image_matches_host_runtime() {
        assert!(image_matches("python3.12", "editor", &runtimes()));
        assert!(image_matches("PythonW.exe", "editor", &runtimes()));
    }

    #[test]
    fn test_image_mismatch() {
        assert!(!image_matches("bash", "editor", &runtimes()));
        assert!(!image_matches("python3", "editor", &[]));
    }

    #[test]
    fn test_empty_runtime_entries_are_ignored() {
        assert!(!image_matches("bash", "editor", &[String::new()]));
    }

    #[cfg(any(target_os = "linux", windows))]
    #[test]
    fn test_system_table_sees_current_process() {
        let table = SystemProcessTable;
        let me = std::process::id();

        assert!(table.live_pids().unwrap().contains(&me));
        let image = table.image_name(me).unwrap();
        assert!(!image.is_empty());
    }

    #[cfg(any(target_os = "linux", windows))]
    #[test]
    fn test_system_table_current_image_matches_test_binary() {
        let table = SystemProcessTable;
        let exe = std::env::current_exe().unwrap();
        let exe_name = exe.file_name().unwrap().to_string_lossy().to_string();

        let image = table.image_name(std::process::id()).unwrap();
        assert!(image_matches(&image, &exe_name, &[]));
    }
}
