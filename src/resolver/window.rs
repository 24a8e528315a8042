//! Window lookup by owning pid.

use std::ops::ControlFlow;

use super::{Desktop, WindowInfo};

/// Find a visible, titled top-level window owned by `pid`.
///
/// With a `keyword`, the first window whose title contains it
/// (case-insensitive) wins; otherwise, or if none matches, the first
/// owned window in enumeration order.
pub fn find_window(desktop: &dyn Desktop, pid: u32, keyword: Option<&str>) -> Option<WindowInfo> {
    let needle = keyword
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_lowercase);

    let mut first: Option<WindowInfo> = None;
    let mut preferred: Option<WindowInfo> = None;

    let walk = desktop.for_each_window(&mut |window| {
        if !is_candidate(window, pid) {
            return ControlFlow::Continue(());
        }
        if let Some(needle) = &needle
            && window.title.to_lowercase().contains(needle.as_str())
        {
            preferred = Some(window.clone());
            return ControlFlow::Break(());
        }
        if first.is_none() {
            first = Some(window.clone());
            if needle.is_none() {
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    });

    if let Err(e) = walk {
        tracing::debug!(pid, error = %e, "window enumeration failed");
        return None;
    }

    preferred.or(first)
}

/// Whether `pid` owns at least one visible, titled top-level window.
///
/// Stops enumerating at the first match.
pub fn owns_visible_window(desktop: &dyn Desktop, pid: u32) -> bool {
    let mut found = false;
    let walk = desktop.for_each_window(&mut |window| {
        if is_candidate(window, pid) {
            found = true;
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    });
    if let Err(e) = walk {
        tracing::debug!(pid, error = %e, "window enumeration failed");
        return false;
    }
    found
}

fn is_candidate(window: &WindowInfo, pid: u32) -> bool {
    window.pid == pid && !window.title.trim().is_empty()
}
