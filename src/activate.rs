//! Click handler — brings the terminal behind a notification back.
//!
//! Runs in its own short-lived process, possibly hours after the hook,
//! with no console. Every failure ends the run quietly.

use crate::notify::link::ActivationLink;
use crate::resolver::window::find_window;
use crate::resolver::{Desktop, WindowId};

/// What an activation attempt came to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// The URI had no usable pid.
    InvalidLink,
    /// The terminal process has exited since the notification was sent.
    ProcessGone,
    /// The process lives but owns no visible titled window.
    NoWindow,
    /// The platform refused to focus the window.
    Refused(WindowId),
    Activated(WindowId),
}

/// Parse `uri`, revalidate the pid, locate its window (preferring the one
/// titled after the working directory) and focus it.
pub fn activate(desktop: &dyn Desktop, uri: &str) -> Activation {
    let Some(link) = ActivationLink::parse(uri) else {
        tracing::debug!(uri, "unusable activation link");
        return Activation::InvalidLink;
    };

    if !desktop.is_alive(link.pid) {
        tracing::debug!(pid = link.pid, "activation target is gone");
        return Activation::ProcessGone;
    }

    let Some(window) = find_window(desktop, link.pid, link.keyword()) else {
        tracing::debug!(%link, "no window for activation target");
        return Activation::NoWindow;
    };

    match desktop.activate(&window) {
        Ok(()) => {
            tracing::debug!(%link, title = %window.title, "window activated");
            Activation::Activated(window.id)
        }
        Err(e) => {
            tracing::debug!(%link, error = %e, "window activation failed");
            Activation::Refused(window.id)
        }
    }
}
