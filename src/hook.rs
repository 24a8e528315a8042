//! Hook pipeline — payload in, notification out.
//!
//! Invoked by the assistant on `Stop` and `Notification`. Any other event
//! is a silent no-op, and nothing in the pipeline can fail the hook.

use std::io::{IsTerminal, Read};
use std::path::PathBuf;

use serde::Deserialize;

use crate::naming::SessionNamer;
use crate::naming::remote::Summarizer;
use crate::notify::link::ActivationLink;
use crate::notify::sink::NotificationSink;
use crate::notify::{Chime, Dispatcher, NotificationRequest, Sound};
use crate::resolver::Desktop;
use crate::resolver::process::terminal_pid;

/// Environment variable carrying the hook payload.
pub const PAYLOAD_VAR: &str = "HOOK_INPUT";

/// Cap on the assistant message echoed in a Stop notification.
const STOP_BODY_CHARS: usize = 80;

const STOP_TITLE: &str = "✅ 已完成";
const STOP_BODY: &str = "回复已完成";
const WAITING_TITLE: &str = "⏳ 等待操作";
const WAITING_BODY: &str = "需要你的输入";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// The assistant finished responding.
    Stop,
    /// The assistant needs input or permission.
    Notification,
}

/// Raw payload as the assistant sends it. Absent and `null` fields both
/// read as empty.
#[derive(Debug, Deserialize)]
struct Payload {
    #[serde(default)]
    hook_event_name: Option<String>,
    #[serde(default)]
    cwd: Option<String>,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    transcript_path: Option<String>,
    #[serde(default)]
    last_assistant_message: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// One hook invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookEvent {
    pub kind: EventKind,
    pub cwd: PathBuf,
    pub session_id: String,
    pub transcript_path: Option<PathBuf>,
    pub last_assistant_message: String,
    pub notification_message: String,
}

impl HookEvent {
    /// Parse a payload. Malformed JSON and unhandled event kinds are `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let payload: Payload = match serde_json::from_str(raw) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::debug!(error = %e, "malformed hook payload");
                return None;
            }
        };
        let kind = match payload.hook_event_name.as_deref().unwrap_or_default() {
            "Stop" => EventKind::Stop,
            "Notification" => EventKind::Notification,
            other => {
                tracing::debug!(event = other, "ignoring hook event");
                return None;
            }
        };
        Some(Self {
            kind,
            cwd: PathBuf::from(payload.cwd.unwrap_or_default()),
            session_id: payload.session_id.unwrap_or_default(),
            transcript_path: payload
                .transcript_path
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
            last_assistant_message: payload.last_assistant_message.unwrap_or_default(),
            notification_message: payload.message.unwrap_or_default(),
        })
    }

    /// Title, body and sound for this event, with `label` as subtitle.
    pub fn request(&self, label: String, link: Option<ActivationLink>) -> NotificationRequest {
        let (title, body, fallback, sound) = match self.kind {
            EventKind::Stop => (
                STOP_TITLE,
                one_line(&self.last_assistant_message, Some(STOP_BODY_CHARS)),
                STOP_BODY,
                Sound::Hero,
            ),
            EventKind::Notification => (
                WAITING_TITLE,
                one_line(&self.notification_message, None),
                WAITING_BODY,
                Sound::Sosumi,
            ),
        };
        NotificationRequest {
            title: title.to_string(),
            subtitle: label,
            body: if body.is_empty() { fallback.to_string() } else { body },
            sound,
            link,
        }
    }
}

/// Read the payload from `HOOK_INPUT`, or from stdin when that is unset
/// and stdin is piped.
pub fn read_payload() -> Option<String> {
    if let Ok(raw) = std::env::var(PAYLOAD_VAR) {
        return Some(raw);
    }
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        return None;
    }
    let mut raw = String::new();
    match stdin.lock().read_to_string(&mut raw) {
        Ok(_) => Some(raw),
        Err(e) => {
            tracing::debug!(error = %e, "failed to read hook payload from stdin");
            None
        }
    }
}

/// Collaborators for one hook run.
pub struct Hook<'a, R, S, C> {
    pub namer: &'a SessionNamer<R>,
    pub desktop: &'a dyn Desktop,
    pub dispatcher: &'a Dispatcher<S, C>,
    /// Pid the ancestry walk starts from (normally our own).
    pub self_pid: u32,
}

impl<R: Summarizer, S: NotificationSink, C: Chime> Hook<'_, R, S, C> {
    /// Name the session, find the terminal, notify. Returns the request
    /// that was dispatched.
    pub async fn run(&self, event: &HookEvent) -> NotificationRequest {
        let label = self
            .namer
            .name(event.transcript_path.as_deref(), &event.session_id, &event.cwd)
            .await;

        let link = terminal_pid(self.desktop, self.self_pid)
            .map(|pid| ActivationLink::new(pid, event.cwd.to_string_lossy()));
        tracing::debug!(label = %label, terminal = ?link.as_ref().map(|l| l.pid), "hook resolved");

        let request = event.request(label, link);
        self.dispatcher.send(&request).await;
        request
    }
}

fn one_line(text: &str, limit: Option<usize>) -> String {
    let flat = text.replace(['\r', '\n'], " ");
    let flat = flat.trim();
    match limit {
        Some(n) => flat.chars().take(n).collect::<String>().trim_end().to_string(),
        None => flat.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::naming::cache::LabelCache;
    use crate::naming::remote::RemoteSummarizer;
    use crate::notify::sink::NotifyError;
    use crate::resolver::fake::FakeDesktop;

    #[derive(Default, Clone)]
    struct Recorder(Rc<RefCell<Vec<NotificationRequest>>>);

    impl NotificationSink for Recorder {
        async fn deliver(&self, request: &NotificationRequest) -> Result<(), NotifyError> {
            self.0.borrow_mut().push(request.clone());
            Ok(())
        }
    }

    struct Silent;

    impl Chime for Silent {
        fn play(&self, _sound: Sound) {}
    }

    #[test]
    fn parses_stop_payload() {
        let event = HookEvent::parse(
            r#"{"hook_event_name":"Stop","cwd":"/home/u/my-project","session_id":"abc","transcript_path":"/tmp/t.jsonl","last_assistant_message":"All done"}"#,
        )
        .unwrap();
        assert_eq!(event.kind, EventKind::Stop);
        assert_eq!(event.cwd, PathBuf::from("/home/u/my-project"));
        assert_eq!(event.transcript_path, Some(PathBuf::from("/tmp/t.jsonl")));
        assert_eq!(event.notification_message, "");
    }

    #[test]
    fn other_events_are_ignored() {
        assert_eq!(HookEvent::parse(r#"{"hook_event_name":"PreToolUse"}"#), None);
        assert_eq!(HookEvent::parse("{}"), None);
        assert_eq!(HookEvent::parse("not json"), None);
        assert_eq!(HookEvent::parse(""), None);
    }

    #[test]
    fn stop_body_is_one_trimmed_line() {
        let event = HookEvent::parse(&format!(
            r#"{{"hook_event_name":"Stop","last_assistant_message":"line one\nline two {}"}}"#,
            "x".repeat(100)
        ))
        .unwrap();
        let request = event.request("label".into(), None);
        assert_eq!(request.title, STOP_TITLE);
        assert_eq!(request.sound, Sound::Hero);
        assert!(request.body.starts_with("line one line two"));
        assert_eq!(request.body.chars().count(), STOP_BODY_CHARS);
    }

    #[test]
    fn empty_messages_use_defaults() {
        let stop = HookEvent::parse(r#"{"hook_event_name":"Stop"}"#).unwrap();
        assert_eq!(stop.request(String::new(), None).body, STOP_BODY);

        let waiting = HookEvent::parse(r#"{"hook_event_name":"Notification","message":" \n "}"#).unwrap();
        let request = waiting.request(String::new(), None);
        assert_eq!(request.title, WAITING_TITLE);
        assert_eq!(request.body, WAITING_BODY);
        assert_eq!(request.sound, Sound::Sosumi);
    }

    #[test]
    fn null_fields_read_as_empty() {
        let event = HookEvent::parse(
            r#"{"hook_event_name":"Stop","cwd":null,"session_id":null,"transcript_path":null,"last_assistant_message":null}"#,
        )
        .unwrap();
        assert_eq!(event.transcript_path, None);
        assert_eq!(event.session_id, "");
        assert_eq!(event.request("label".into(), None).body, STOP_BODY);

        assert_eq!(HookEvent::parse(r#"{"hook_event_name":null}"#), None);
    }

    #[test]
    fn quotes_survive_for_the_sink_to_escape() {
        let event =
            HookEvent::parse(r#"{"hook_event_name":"Notification","message":"Allow \"rm\"?"}"#).unwrap();
        assert_eq!(event.request(String::new(), None).body, r#"Allow "rm"?"#);
    }

    #[tokio::test]
    async fn pipeline_links_the_terminal() {
        let dir = tempfile::tempdir().unwrap();
        let namer = SessionNamer::new(LabelCache::new(dir.path()), RemoteSummarizer::Disabled);
        let mut desktop = FakeDesktop::default();
        desktop
            .parent(500, 400)
            .parent(400, 300)
            .parent(300, 1)
            .window(1, 300, "my-project — terminal");
        let delivered = Recorder::default();
        let dispatcher = Dispatcher::new(delivered.clone(), Silent);
        let hook = Hook {
            namer: &namer,
            desktop: &desktop,
            dispatcher: &dispatcher,
            self_pid: 500,
        };

        let event = HookEvent::parse(
            r#"{"hook_event_name":"Notification","cwd":"/home/u/my-project","session_id":"s1","message":"Needs approval"}"#,
        )
        .unwrap();
        let request = hook.run(&event).await;

        assert_eq!(request.subtitle, "my-project");
        assert_eq!(request.body, "Needs approval");
        assert_eq!(request.link, Some(ActivationLink::new(300, "/home/u/my-project")));
        assert_eq!(delivered.0.borrow().as_slice(), &[request]);
    }

    #[tokio::test]
    async fn pipeline_without_ancestry_has_no_link() {
        let dir = tempfile::tempdir().unwrap();
        let namer = SessionNamer::new(LabelCache::new(dir.path()), RemoteSummarizer::Disabled);
        let desktop = crate::resolver::NullDesktop;
        let dispatcher = Dispatcher::new(Recorder::default(), Silent);
        let hook = Hook {
            namer: &namer,
            desktop: &desktop,
            dispatcher: &dispatcher,
            self_pid: 500,
        };

        let event = HookEvent::parse(r#"{"hook_event_name":"Stop","cwd":"/srv/app"}"#).unwrap();
        let request = hook.run(&event).await;
        assert_eq!(request.link, None);
        assert_eq!(request.subtitle, "app");
    }
}
