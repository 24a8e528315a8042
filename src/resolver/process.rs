//! Process ancestry walk — finds the terminal that launched us.
//!
//! Walks upward from a pid via [`Desktop::parent_pid`] and picks the
//! closest ancestor that owns a visible window. The `/proc` reader used
//! by the Linux desktop lives here too.

use std::collections::HashSet;

use super::Desktop;
use super::window::owns_visible_window;

/// Parents at or below this pid end the walk (0: none, 1: init).
const ROOT_PID: u32 = 1;

/// Parent query behind the Linux desktop, from `/proc/<pid>/stat`.
#[cfg(target_os = "linux")]
pub fn procfs_ppid(pid: u32) -> Option<u32> {
    let stat = std::fs::read_to_string(format!("/proc/{pid}/stat")).ok()?;
    stat_ppid(&stat)
}

/// Field 4 of a `stat` line. The command name in field 2 may itself hold
/// spaces and parentheses, so fields are counted from its last `)`.
#[cfg(target_os = "linux")]
fn stat_ppid(stat: &str) -> Option<u32> {
    let (_, rest) = stat.rsplit_once(')')?;
    rest.split_whitespace().nth(1)?.parse().ok()
}

/// Ancestors of `start`, nearest first, excluding `start` itself.
///
/// Stops at the root sentinel, at a missing parent, or when a pid
/// repeats (pids get reused, so a stale read can loop).
pub fn ancestors(desktop: &dyn Desktop, start: u32) -> Vec<u32> {
    let mut chain = Vec::new();
    let mut visited = HashSet::from([start]);
    let mut current = start;

    while let Some(parent) = desktop.parent_pid(current) {
        if parent <= ROOT_PID || !visited.insert(parent) {
            break;
        }
        chain.push(parent);
        current = parent;
    }

    chain
}

/// Resolve the pid of the terminal that owns `start`.
///
/// Returns the nearest ancestor owning a visible titled window. When none
/// does, the outermost ancestor is the best guess; an empty walk yields
/// `None`.
pub fn terminal_pid(desktop: &dyn Desktop, start: u32) -> Option<u32> {
    let chain = ancestors(desktop, start);
    if let Some(&pid) = chain.iter().find(|&&pid| owns_visible_window(desktop, pid)) {
        tracing::debug!(pid, depth = chain.len(), "terminal window owner found");
        return Some(pid);
    }
    let outermost = chain.last().copied();
    tracing::debug!(?outermost, "no ancestor owns a window");
    outermost
}
