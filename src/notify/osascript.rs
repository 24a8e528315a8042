//! macOS transport — `osascript -e 'display notification …'`.
//!
//! Notification Center gives scripts no click callback, so the
//! activation link is dropped here.

use super::NotificationRequest;
use super::sink::{NotificationSink, NotifyError, flatten_controls, run};

pub struct AppleScriptSink;

impl NotificationSink for AppleScriptSink {
    async fn deliver(&self, request: &NotificationRequest) -> Result<(), NotifyError> {
        if let Some(link) = &request.link {
            tracing::debug!(%link, "macOS notifications cannot carry a click target");
        }
        run("osascript", &["-e".to_string(), script(request)]).await.map(drop)
    }
}

/// Escape text for an AppleScript double-quoted string literal.
pub fn escape(text: &str) -> String {
    flatten_controls(text)
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
}

/// The `display notification` statement for `request`.
pub fn script(request: &NotificationRequest) -> String {
    format!(
        r#"display notification "{}" with title "{}" subtitle "{}""#,
        escape(&request.body),
        escape(&request.title),
        escape(&request.subtitle),
    )
}
