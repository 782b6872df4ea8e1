use crate::config::GuardConfig;
use crate::process::ProcessTable;
use std::collections::HashMap;
use std::io;
use tempfile::TempDir;

/// Process table with a fixed set of processes.
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeProcessTable {
    processes: HashMap<u32, String>,
    unavailable: bool,
}

impl FakeProcessTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_process(mut self, pid: u32, image: &str) -> Self {
        self.processes.insert(pid, image.to_string());
        self
    }

    /// Register the current process under the given image name.
    pub(crate) fn with_current(self, image: &str) -> Self {
        self.with_process(std::process::id(), image)
    }

    /// A table whose enumeration always fails.
    pub(crate) fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }
}

impl ProcessTable for FakeProcessTable {
    fn live_pids(&self) -> io::Result<Vec<u32>> {
        if self.unavailable {
            return Err(io::Error::other("process table unavailable"));
        }
        Ok(self.processes.keys().copied().collect())
    }

    fn image_name(&self, pid: u32) -> Option<String> {
        self.processes.get(&pid).cloned()
    }
}

/// A fresh data root and a config pointing at it.
pub(crate) fn temp_data_root() -> (TempDir, GuardConfig) {
    let temp_dir = TempDir::new().unwrap();
    let config = GuardConfig::default().with_data_root(temp_dir.path());
    (temp_dir, config)
}
