//! Notification dispatch — sound plus a platform notification.

pub mod libnotify;
pub mod link;
pub mod osascript;
pub mod sink;
pub mod sound;
pub mod toast;

use link::ActivationLink;
use sink::NotificationSink;
pub use sound::{Chime, Sound};

/// A notification ready for the sink. Text fields are raw; each sink
/// escapes them for its own markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    pub title: String,
    /// Session label.
    pub subtitle: String,
    pub body: String,
    pub sound: Sound,
    /// Click target, when the terminal could be resolved.
    pub link: Option<ActivationLink>,
}

pub struct Dispatcher<S, C> {
    sink: S,
    chime: C,
}

impl<S: NotificationSink, C: Chime> Dispatcher<S, C> {
    pub fn new(sink: S, chime: C) -> Self {
        Self { sink, chime }
    }

    /// Start the sound, then deliver. Neither outcome affects the other,
    /// and failures are only logged.
    pub async fn send(&self, request: &NotificationRequest) {
        self.chime.play(request.sound);
        match self.sink.deliver(request).await {
            Ok(()) => tracing::debug!(
                title = %request.title,
                subtitle = %request.subtitle,
                linked = request.link.is_some(),
                "notification delivered"
            ),
            Err(e) => tracing::warn!(error = %e, "notification delivery failed"),
        }
    }
}
