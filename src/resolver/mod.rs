//! Desktop resolution — process ancestry, window enumeration, activation.
//!
//! Everything OS-specific sits behind the [`Desktop`] trait. The walker and
//! locator in this module only talk to the trait, so they run unchanged
//! against X11, Win32, or the fake desktop used in tests.

pub mod process;
pub mod window;

#[cfg(target_os = "linux")]
pub mod x11;

#[cfg(windows)]
pub mod windows;

use std::ops::ControlFlow;

/// Resolver error.
#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    /// The platform has no windowing facility we can talk to.
    #[error("window system unavailable")]
    Unavailable,
    /// X11 protocol or connection failure.
    #[cfg(target_os = "linux")]
    #[error("x11: {0}")]
    X11(String),
    /// Win32 call failure.
    #[cfg(windows)]
    #[error("win32: {0}")]
    Win32(String),
}

/// Opaque OS window identifier (X11 XID or HWND).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(pub u64);

/// A visible top-level window, as produced by enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    pub id: WindowId,
    pub pid: u32,
    pub title: String,
}

/// Platform capabilities needed to find and focus a terminal window.
pub trait Desktop {
    /// Visit every visible top-level window in OS enumeration order.
    ///
    /// The visitor returns `ControlFlow::Break(())` to stop early.
    fn for_each_window(
        &self,
        visit: &mut dyn FnMut(&WindowInfo) -> ControlFlow<()>,
    ) -> Result<(), ResolverError>;

    /// Parent pid of `pid`, or `None` if the process is gone or the
    /// platform has no ancestry query.
    fn parent_pid(&self, pid: u32) -> Option<u32>;

    /// Lightweight liveness probe.
    fn is_alive(&self, pid: u32) -> bool;

    /// Restore `window` if minimized and bring it to the foreground.
    fn activate(&self, window: &WindowInfo) -> Result<(), ResolverError>;
}

/// Desktop for platforms with no supported windowing facility.
#[cfg_attr(any(target_os = "linux", windows), allow(dead_code))]
pub struct NullDesktop;

impl Desktop for NullDesktop {
    fn for_each_window(
        &self,
        _visit: &mut dyn FnMut(&WindowInfo) -> ControlFlow<()>,
    ) -> Result<(), ResolverError> {
        Err(ResolverError::Unavailable)
    }

    fn parent_pid(&self, _pid: u32) -> Option<u32> {
        None
    }

    fn is_alive(&self, _pid: u32) -> bool {
        false
    }

    fn activate(&self, _window: &WindowInfo) -> Result<(), ResolverError> {
        Err(ResolverError::Unavailable)
    }
}

/// Pick the desktop implementation for the running platform.
#[cfg(target_os = "linux")]
pub fn detect() -> Box<dyn Desktop> {
    Box::new(x11::LinuxDesktop::connect())
}

/// Pick the desktop implementation for the running platform.
#[cfg(windows)]
pub fn detect() -> Box<dyn Desktop> {
    Box::new(windows::Win32Desktop)
}

/// Pick the desktop implementation for the running platform.
#[cfg(not(any(target_os = "linux", windows)))]
pub fn detect() -> Box<dyn Desktop> {
    Box::new(NullDesktop)
}

#[cfg(test)]
pub(crate) mod fake {
    //! In-memory desktop for exercising the walker, locator and activator.

    use std::cell::RefCell;
    use std::collections::{HashMap, HashSet};

    use super::*;

    #[derive(Default)]
    pub struct FakeDesktop {
        pub parents: HashMap<u32, u32>,
        pub windows: Vec<WindowInfo>,
        pub alive: HashSet<u32>,
        pub activated: RefCell<Vec<WindowId>>,
        /// Number of windows handed to visitors, to observe short-circuiting.
        pub visited: RefCell<usize>,
    }

    impl FakeDesktop {
        pub fn window(&mut self, id: u64, pid: u32, title: &str) -> &mut Self {
            self.windows.push(WindowInfo {
                id: WindowId(id),
                pid,
                title: title.to_string(),
            });
            self
        }

        pub fn parent(&mut self, pid: u32, ppid: u32) -> &mut Self {
            self.parents.insert(pid, ppid);
            self
        }
    }

    impl Desktop for FakeDesktop {
        fn for_each_window(
            &self,
            visit: &mut dyn FnMut(&WindowInfo) -> ControlFlow<()>,
        ) -> Result<(), ResolverError> {
            for window in &self.windows {
                *self.visited.borrow_mut() += 1;
                if visit(window).is_break() {
                    break;
                }
            }
            Ok(())
        }

        fn parent_pid(&self, pid: u32) -> Option<u32> {
            self.parents.get(&pid).copied()
        }

        fn is_alive(&self, pid: u32) -> bool {
            self.alive.contains(&pid)
        }

        fn activate(&self, window: &WindowInfo) -> Result<(), ResolverError> {
            self.activated.borrow_mut().push(window.id);
            Ok(())
        }
    }
}
