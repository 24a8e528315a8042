//! Sink delivery — hands a formatted notification to the OS.
//!
//! Each transport shells out to the platform's notification tool. They
//! all compile everywhere; [`PlatformSink::detect`] picks the one for the
//! running OS.

use std::process::{ExitStatus, Stdio};

use tokio::process::Command;

use super::NotificationRequest;
use super::libnotify::NotifySendSink;
use super::osascript::AppleScriptSink;
use super::toast::ToastSink;
use crate::config::Config;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} exited with {status}")]
    Failed {
        program: &'static str,
        status: ExitStatus,
    },
}

/// Something that can put a notification on screen.
#[allow(async_fn_in_trait)]
pub trait NotificationSink {
    async fn deliver(&self, request: &NotificationRequest) -> Result<(), NotifyError>;
}

/// The transport for the running platform.
pub enum PlatformSink {
    AppleScript(AppleScriptSink),
    Toast(ToastSink),
    NotifySend(NotifySendSink),
}

impl PlatformSink {
    pub fn detect(config: &Config) -> Self {
        if cfg!(target_os = "macos") {
            Self::AppleScript(AppleScriptSink)
        } else if cfg!(windows) {
            Self::Toast(ToastSink::new(&config.app_id, &config.uri_scheme))
        } else {
            Self::NotifySend(NotifySendSink::new(&config.uri_scheme))
        }
    }
}

impl NotificationSink for PlatformSink {
    async fn deliver(&self, request: &NotificationRequest) -> Result<(), NotifyError> {
        match self {
            Self::AppleScript(sink) => sink.deliver(request).await,
            Self::Toast(sink) => sink.deliver(request).await,
            Self::NotifySend(sink) => sink.deliver(request).await,
        }
    }
}

/// Run `program` to completion and return its stdout.
///
/// Stdin is closed and stderr discarded. Non-zero exit is an error.
pub(crate) async fn run(program: &'static str, args: &[String]) -> Result<String, NotifyError> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .await
        .map_err(|source| NotifyError::Spawn { program, source })?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    } else {
        Err(NotifyError::Failed {
            program,
            status: output.status,
        })
    }
}

/// Start `program` and leave it running after we exit.
///
/// The child is not awaited; on Unix it gets its own process group so
/// the hook runner's cleanup doesn't take it down.
pub(crate) fn spawn_detached(
    program: impl AsRef<std::ffi::OsStr>,
    args: &[String],
    label: &'static str,
) -> Result<(), NotifyError> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    #[cfg(unix)]
    cmd.process_group(0);

    cmd.spawn()
        .map(drop)
        .map_err(|source| NotifyError::Spawn {
            program: label,
            source,
        })
}

/// Replace control characters (newlines included) with spaces.
pub(crate) fn flatten_controls(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_replaces_controls() {
        assert_eq!(flatten_controls("a\nb\tc\u{7}d"), "a b c d");
        assert_eq!(flatten_controls("完成 ✅"), "完成 ✅");
    }

    #[tokio::test]
    async fn missing_program_is_spawn_error() {
        let result = run("session-notifier-no-such-tool", &[]).await;
        assert!(matches!(result, Err(NotifyError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_program_is_failed_error() {
        let result = run("false", &[]).await;
        assert!(matches!(result, Err(NotifyError::Failed { program: "false", .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stdout_is_returned() {
        let out = run("echo", &["default".to_string()]).await.unwrap();
        assert_eq!(out.trim(), "default");
    }
}
