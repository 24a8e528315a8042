//! Linux transport — `notify-send` against the freedesktop notification
//! daemon.
//!
//! A click target needs somebody waiting on the daemon after the hook has
//! exited, so with a link the sink re-launches this binary detached as
//! `await-click`; that helper blocks in `notify-send --wait` and activates
//! the terminal when the default action fires.

use super::NotificationRequest;
use super::sink::{NotificationSink, NotifyError, flatten_controls, run, spawn_detached};
use crate::config::APP_NAME;

/// Action key reported by `notify-send --wait` on a body click.
const DEFAULT_ACTION: &str = "default";

pub struct NotifySendSink {
    scheme: String,
}

impl NotifySendSink {
    pub fn new(scheme: &str) -> Self {
        Self {
            scheme: scheme.to_string(),
        }
    }

    /// Show `request` and block until it is clicked or dismissed.
    ///
    /// Returns `true` when the user clicked the notification body.
    pub async fn wait_for_click(&self, request: &NotificationRequest) -> bool {
        match run("notify-send", &args(request, true)).await {
            Ok(stdout) => stdout.lines().any(|line| line.trim() == DEFAULT_ACTION),
            Err(e) => {
                // notify-send older than 0.7.9 has no --wait/--action.
                tracing::debug!(error = %e, "notify-send --wait failed, sending plain");
                if let Err(e) = run("notify-send", &args(request, false)).await {
                    tracing::debug!(error = %e, "notify-send failed");
                }
                false
            }
        }
    }

    fn spawn_waiter(&self, request: &NotificationRequest, uri: String) -> Result<(), NotifyError> {
        let exe = std::env::current_exe().map_err(|source| NotifyError::Spawn {
            program: APP_NAME,
            source,
        })?;
        let args = waiter_args(request, uri);
        spawn_detached(exe, &args, APP_NAME)
    }
}

impl NotificationSink for NotifySendSink {
    async fn deliver(&self, request: &NotificationRequest) -> Result<(), NotifyError> {
        if let Some(link) = &request.link {
            match self.spawn_waiter(request, link.to_uri(&self.scheme)) {
                Ok(()) => return Ok(()),
                Err(e) => tracing::debug!(error = %e, "click waiter unavailable"),
            }
        }
        run("notify-send", &args(request, false)).await.map(drop)
    }
}

/// Arguments for the detached `await-click` helper. Values are attached
/// with `=` so text starting with `-` is not read as a flag.
fn waiter_args(request: &NotificationRequest, uri: String) -> Vec<String> {
    vec![
        "await-click".to_string(),
        format!("--title={}", request.title),
        format!("--subtitle={}", request.subtitle),
        format!("--body={}", request.body),
        "--".to_string(),
        uri,
    ]
}

/// Escape for the Pango-style body markup the daemon renders.
pub fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in flatten_controls(text).chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

/// `notify-send` argument vector. The summary is plain text; the body is
/// markup with the session label in bold on its own line.
pub fn args(request: &NotificationRequest, wait: bool) -> Vec<String> {
    let mut args = vec![format!("--app-name={APP_NAME}")];
    if wait {
        args.push("--wait".to_string());
        args.push(format!("--action={DEFAULT_ACTION}=Open"));
    }
    let body = if request.subtitle.is_empty() {
        escape_markup(&request.body)
    } else {
        format!(
            "<b>{}</b>\n{}",
            escape_markup(&request.subtitle),
            escape_markup(&request.body)
        )
    };
    args.push("--".to_string());
    args.push(flatten_controls(&request.title));
    args.push(body);
    args
}
