//! Win32 process queries (psapi entry points exported by kernel32).

use std::ffi::c_void;
use std::io;
use std::mem::size_of;
use std::ptr;

type Handle = *mut c_void;

const PROCESS_QUERY_INFORMATION: u32 = 0x0400;
const PROCESS_VM_READ: u32 = 0x0010;
const MAX_PATH: usize = 260;

#[link(name = "kernel32")]
unsafe extern "system" {
    fn K32EnumProcesses(lpidProcess: *mut u32, cb: u32, lpcbNeeded: *mut u32) -> i32;

    fn OpenProcess(dwDesiredAccess: u32, bInheritHandle: i32, dwProcessId: u32) -> Handle;

    fn K32GetModuleBaseNameW(
        hProcess: Handle,
        hModule: Handle,
        lpBaseName: *mut u16,
        nSize: u32,
    ) -> u32;

    fn CloseHandle(hObject: Handle) -> i32;
}

pub(super) fn live_pids() -> io::Result<Vec<u32>> {
    let mut capacity = 1024usize;

    loop {
        let mut pids = vec![0u32; capacity];
        let buffer_bytes = (capacity * size_of::<u32>()) as u32;
        let mut needed = 0u32;

        // SAFETY: the buffer holds `buffer_bytes` bytes and `needed` is a valid out pointer.
        let ok = unsafe { K32EnumProcesses(pids.as_mut_ptr(), buffer_bytes, &mut needed) };
        if ok == 0 {
            return Err(io::Error::last_os_error());
        }

        // A completely filled buffer may have been truncated; retry larger.
        if needed < buffer_bytes {
            pids.truncate(needed as usize / size_of::<u32>());
            return Ok(pids);
        }
        capacity *= 2;
    }
}

pub(super) fn image_name(pid: u32) -> Option<String> {
    // SAFETY: plain value arguments; a null handle is checked before use.
    let handle = unsafe { OpenProcess(PROCESS_QUERY_INFORMATION | PROCESS_VM_READ, 0, pid) };
    if handle.is_null() {
        return None;
    }

    let mut buffer = [0u16; MAX_PATH];
    // SAFETY: `handle` is open and `buffer` holds `MAX_PATH` UTF-16 units.
    let len = unsafe {
        K32GetModuleBaseNameW(
            handle,
            ptr::null_mut(),
            buffer.as_mut_ptr(),
            buffer.len() as u32,
        )
    };
    // SAFETY: `handle` was returned by OpenProcess and is closed exactly once.
    unsafe { CloseHandle(handle) };

    if len == 0 {
        return None;
    }
    Some(String::from_utf16_lossy(&buffer[..len as usize]))
}
