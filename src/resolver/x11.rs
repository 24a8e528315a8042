//! Linux desktop — `/proc` ancestry plus EWMH window queries over X11.
//!
//! Window enumeration reads `_NET_CLIENT_LIST` from the root window, so
//! it sees every top-level window the window manager manages, minimized
//! ones included. Activation maps the window (ICCCM de-iconify) and asks
//! the window manager to focus it via `_NET_ACTIVE_WINDOW`.

use std::ops::ControlFlow;

use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::Pid;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{self, Atom, AtomEnum, ClientMessageEvent, EventMask, MapState, Window};
use x11rb::rust_connection::RustConnection;

use super::process::procfs_ppid;
use super::{Desktop, ResolverError, WindowId, WindowInfo};

/// `_NET_ACTIVE_WINDOW` source indication: request from a pager/tool.
const SOURCE_PAGER: u32 = 2;

/// X11 `CurrentTime`.
const CURRENT_TIME: u32 = 0;

/// Upper bound on property reads, in 32-bit units.
const MAX_PROPERTY_LEN: u32 = 4096;

/// Pre-interned X11 atoms for property queries.
struct Atoms {
    net_client_list: Atom,
    net_active_window: Atom,
    net_wm_pid: Atom,
    net_wm_name: Atom,
    utf8_string: Atom,
}

/// X11 connection context.
pub struct X11Context {
    conn: RustConnection,
    root: Window,
    atoms: Atoms,
}

fn intern(conn: &RustConnection, name: &[u8]) -> Result<Atom, ResolverError> {
    Ok(xproto::intern_atom(conn, false, name)
        .map_err(|e| ResolverError::X11(format!("intern_atom: {e}")))?
        .reply()
        .map_err(|e| ResolverError::X11(format!("intern_atom reply: {e}")))?
        .atom)
}

impl X11Context {
    /// Connect to the display named by `$DISPLAY` and intern atoms.
    pub fn connect() -> Result<Self, ResolverError> {
        let (conn, screen_num) = RustConnection::connect(None)
            .map_err(|e| ResolverError::X11(format!("connect failed: {e}")))?;

        let root = conn.setup().roots[screen_num].root;

        let atoms = Atoms {
            net_client_list: intern(&conn, b"_NET_CLIENT_LIST")?,
            net_active_window: intern(&conn, b"_NET_ACTIVE_WINDOW")?,
            net_wm_pid: intern(&conn, b"_NET_WM_PID")?,
            net_wm_name: intern(&conn, b"_NET_WM_NAME")?,
            utf8_string: intern(&conn, b"UTF8_STRING")?,
        };

        Ok(Self { conn, root, atoms })
    }

    fn property(
        &self,
        window: Window,
        property: Atom,
        type_: impl Into<Atom>,
    ) -> Result<xproto::GetPropertyReply, ResolverError> {
        xproto::get_property(&self.conn, false, window, property, type_, 0, MAX_PROPERTY_LEN)
            .map_err(|e| ResolverError::X11(format!("get_property: {e}")))?
            .reply()
            .map_err(|e| ResolverError::X11(format!("get_property reply: {e}")))
    }

    /// Managed top-level windows, in the window manager's order.
    fn client_list(&self) -> Result<Vec<Window>, ResolverError> {
        let reply = self.property(self.root, self.atoms.net_client_list, AtomEnum::WINDOW)?;
        Ok(reply
            .value32()
            .map(|ids| ids.collect())
            .unwrap_or_default())
    }

    /// `_NET_WM_PID` of a window, if the client set it.
    fn window_pid(&self, window: Window) -> Option<u32> {
        let reply = self
            .property(window, self.atoms.net_wm_pid, AtomEnum::CARDINAL)
            .ok()?;
        reply.value32()?.next()
    }

    /// `_NET_WM_NAME`, falling back to the legacy `WM_NAME`.
    fn window_title(&self, window: Window) -> String {
        if let Ok(reply) = self.property(window, self.atoms.net_wm_name, self.atoms.utf8_string)
            && !reply.value.is_empty()
        {
            return String::from_utf8_lossy(&reply.value).into_owned();
        }
        match self.property(window, AtomEnum::WM_NAME.into(), AtomEnum::STRING) {
            Ok(reply) => String::from_utf8_lossy(&reply.value).into_owned(),
            Err(_) => String::new(),
        }
    }

    fn activate(&self, window: Window) -> Result<(), ResolverError> {
        let attrs = xproto::get_window_attributes(&self.conn, window)
            .map_err(|e| ResolverError::X11(format!("get_window_attributes: {e}")))?
            .reply()
            .map_err(|e| ResolverError::X11(format!("get_window_attributes reply: {e}")))?;

        if attrs.map_state != MapState::VIEWABLE {
            xproto::map_window(&self.conn, window)
                .map_err(|e| ResolverError::X11(format!("map_window: {e}")))?;
        }

        let event = ClientMessageEvent::new(
            32,
            window,
            self.atoms.net_active_window,
            [SOURCE_PAGER, CURRENT_TIME, 0, 0, 0],
        );
        xproto::send_event(
            &self.conn,
            false,
            self.root,
            EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY,
            event,
        )
        .map_err(|e| ResolverError::X11(format!("send_event _NET_ACTIVE_WINDOW: {e}")))?;

        self.conn
            .flush()
            .map_err(|e| ResolverError::X11(format!("flush: {e}")))
    }
}

/// Linux desktop: ancestry from `/proc`, windows from X11 when a display
/// is reachable.
pub struct LinuxDesktop {
    x11: Option<X11Context>,
}

impl LinuxDesktop {
    /// Connect to X11 if possible. Without a display (Wayland-only,
    /// ssh, headless) the desktop still answers ancestry queries.
    pub fn connect() -> Self {
        let x11 = match X11Context::connect() {
            Ok(ctx) => Some(ctx),
            Err(e) => {
                tracing::debug!(error = %e, "X11 unavailable, window lookups disabled");
                None
            }
        };
        Self { x11 }
    }

    /// Ancestry and liveness only, no window system.
    #[cfg(test)]
    pub(crate) fn offline() -> Self {
        Self { x11: None }
    }
}

impl Desktop for LinuxDesktop {
    fn for_each_window(
        &self,
        visit: &mut dyn FnMut(&WindowInfo) -> ControlFlow<()>,
    ) -> Result<(), ResolverError> {
        let ctx = self.x11.as_ref().ok_or(ResolverError::Unavailable)?;

        for window in ctx.client_list()? {
            // Clients that never set _NET_WM_PID can't be matched to a process.
            let Some(pid) = ctx.window_pid(window) else {
                continue;
            };
            let info = WindowInfo {
                id: WindowId(u64::from(window)),
                pid,
                title: ctx.window_title(window),
            };
            if visit(&info).is_break() {
                break;
            }
        }
        Ok(())
    }

    fn parent_pid(&self, pid: u32) -> Option<u32> {
        procfs_ppid(pid)
    }

    fn is_alive(&self, pid: u32) -> bool {
        // kill(0) would signal our own process group.
        let Ok(raw) = i32::try_from(pid) else {
            return false;
        };
        if raw <= 0 {
            return false;
        }
        match kill(Pid::from_raw(raw), None) {
            Ok(()) => true,
            // Exists but owned by someone else.
            Err(Errno::EPERM) => true,
            Err(_) => false,
        }
    }

    fn activate(&self, window: &WindowInfo) -> Result<(), ResolverError> {
        let ctx = self.x11.as_ref().ok_or(ResolverError::Unavailable)?;
        let xid = Window::try_from(window.id.0)
            .map_err(|_| ResolverError::X11(format!("not an X11 window id: {}", window.id.0)))?;
        ctx.activate(xid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_is_alive() {
        assert!(LinuxDesktop::offline().is_alive(std::process::id()));
    }

    #[test]
    fn nonexistent_pid_is_dead() {
        let desktop = LinuxDesktop::offline();
        assert!(!desktop.is_alive(0));
        assert!(!desktop.is_alive(u32::MAX));
        // Above the default pid_max on every kernel we run on.
        assert!(!desktop.is_alive(i32::MAX as u32));
    }

    #[test]
    fn ancestry_works_without_a_display() {
        let desktop = LinuxDesktop::offline();
        assert!(desktop.parent_pid(std::process::id()).is_some());
        let walk = desktop.for_each_window(&mut |_| ControlFlow::Continue(()));
        assert!(matches!(walk, Err(ResolverError::Unavailable)));
    }
}
