//! Windows desktop — Toolhelp ancestry and `EnumWindows` lookups.

use std::ops::ControlFlow;

use winapi::shared::minwindef::{BOOL, DWORD, FALSE, LPARAM, TRUE};
use winapi::shared::windef::HWND;
use winapi::um::handleapi::{CloseHandle, INVALID_HANDLE_VALUE};
use winapi::um::processthreadsapi::OpenProcess;
use winapi::um::tlhelp32::{
    CreateToolhelp32Snapshot, PROCESSENTRY32W, Process32FirstW, Process32NextW, TH32CS_SNAPPROCESS,
};
use winapi::um::winnt::PROCESS_QUERY_LIMITED_INFORMATION;
use winapi::um::winuser::{
    EnumWindows, GetWindowTextLengthW, GetWindowTextW, GetWindowThreadProcessId, IsIconic,
    IsWindowVisible, SW_RESTORE, SetForegroundWindow, ShowWindow,
};

use super::{Desktop, ResolverError, WindowId, WindowInfo};

pub struct Win32Desktop;

struct EnumState<'a> {
    visit: &'a mut dyn FnMut(&WindowInfo) -> ControlFlow<()>,
}

unsafe extern "system" fn enum_window(hwnd: HWND, lparam: LPARAM) -> BOOL {
    // SAFETY: lparam is the &mut EnumState passed to EnumWindows below,
    // alive for the duration of that call.
    let state = unsafe { &mut *(lparam as *mut EnumState<'_>) };

    unsafe {
        if IsWindowVisible(hwnd) == FALSE {
            return TRUE;
        }
        let mut pid: DWORD = 0;
        GetWindowThreadProcessId(hwnd, &mut pid);

        let len = GetWindowTextLengthW(hwnd);
        let title = if len > 0 {
            let mut buf = vec![0u16; len as usize + 1];
            let copied = GetWindowTextW(hwnd, buf.as_mut_ptr(), buf.len() as i32);
            String::from_utf16_lossy(&buf[..copied.max(0) as usize])
        } else {
            String::new()
        };

        let info = WindowInfo {
            id: WindowId(hwnd as usize as u64),
            pid,
            title,
        };
        if (state.visit)(&info).is_break() { FALSE } else { TRUE }
    }
}

impl Desktop for Win32Desktop {
    fn for_each_window(
        &self,
        visit: &mut dyn FnMut(&WindowInfo) -> ControlFlow<()>,
    ) -> Result<(), ResolverError> {
        let mut state = EnumState { visit };
        // EnumWindows reports failure when the callback stops early, so
        // its return value carries no signal here.
        unsafe {
            EnumWindows(Some(enum_window), &mut state as *mut EnumState<'_> as LPARAM);
        }
        Ok(())
    }

    fn parent_pid(&self, pid: u32) -> Option<u32> {
        unsafe {
            let snapshot = CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0);
            if snapshot == INVALID_HANDLE_VALUE {
                return None;
            }
            let mut entry: PROCESSENTRY32W = std::mem::zeroed();
            entry.dwSize = std::mem::size_of::<PROCESSENTRY32W>() as DWORD;

            let mut parent = None;
            let mut more = Process32FirstW(snapshot, &mut entry) != FALSE;
            while more {
                if entry.th32ProcessID == pid {
                    parent = Some(entry.th32ParentProcessID);
                    break;
                }
                more = Process32NextW(snapshot, &mut entry) != FALSE;
            }
            CloseHandle(snapshot);
            parent
        }
    }

    fn is_alive(&self, pid: u32) -> bool {
        unsafe {
            let handle = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, FALSE, pid);
            if handle.is_null() {
                return false;
            }
            CloseHandle(handle);
            true
        }
    }

    fn activate(&self, window: &WindowInfo) -> Result<(), ResolverError> {
        let hwnd = window.id.0 as usize as HWND;
        unsafe {
            if IsIconic(hwnd) != FALSE {
                ShowWindow(hwnd, SW_RESTORE);
            }
            if SetForegroundWindow(hwnd) == FALSE {
                return Err(ResolverError::Win32(format!(
                    "SetForegroundWindow refused for {:#x}",
                    window.id.0
                )));
            }
        }
        Ok(())
    }
}
