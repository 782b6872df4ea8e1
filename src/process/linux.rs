//! `/proc` backed process queries.

use std::fs;
use std::io;
use std::path::Path;

pub(super) fn live_pids() -> io::Result<Vec<u32>> {
    let mut pids = Vec::new();

    for entry in fs::read_dir("/proc")? {
        let entry = entry?;
        if let Some(pid) = entry.file_name().to_str().and_then(|n| n.parse::<u32>().ok()) {
            pids.push(pid);
        }
    }

    Ok(pids)
}

pub(super) fn image_name(pid: u32) -> Option<String> {
    let proc_dir = Path::new("/proc").join(pid.to_string());

    if let Ok(exe) = fs::read_link(proc_dir.join("exe"))
        && let Some(name) = exe.file_name()
    {
        // A replaced binary shows up as "name (deleted)".
        let name = name.to_string_lossy();
        return Some(name.trim_end_matches(" (deleted)").to_string());
    }

    // Kernel-truncated to 15 bytes, but readable for any user.
    fs::read_to_string(proc_dir.join("comm"))
        .ok()
        .map(|comm| comm.trim_end().to_string())
        .filter(|comm| !comm.is_empty())
}
