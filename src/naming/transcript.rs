//! First-user-message extraction from a JSONL session transcript.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

/// Cap on the extracted message, in characters.
const MAX_MESSAGE_CHARS: usize = 200;

/// Message content: a bare string or a list of typed segments.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Content {
    Text(String),
    Segments(Vec<Segment>),
}

impl Default for Content {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

#[derive(Debug, Deserialize)]
struct Segment {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// A record is the user's when `type` (if present) and `message.role`
/// both say so. Nothing else about the record is inspected.
fn is_user(record: &Value) -> bool {
    let kind_ok = record.get("type").is_none_or(|k| k == "user");
    let role_ok = record
        .get("message")
        .and_then(|m| m.get("role"))
        .is_some_and(|r| r == "user");
    kind_ok && role_ok
}

impl Content {
    fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Segments(segments) => segments
                .into_iter()
                .filter(|s| s.kind == "text")
                .map(|s| s.text.unwrap_or_default())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

/// Return the first user-authored message in the transcript at `path`,
/// normalized to a single trimmed line of at most 200 characters.
///
/// Any failure (unreadable file, malformed line, no user message)
/// yields an empty string. Reading stops at the first user record.
pub fn first_user_message(path: &Path) -> String {
    match scan(path) {
        Ok(Some(text)) => normalize(&text),
        Ok(None) => String::new(),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "transcript unreadable");
            String::new()
        }
    }
}

fn scan(path: &Path) -> Result<Option<String>, std::io::Error> {
    let reader = BufReader::new(File::open(path)?);
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record: Value = serde_json::from_str(line)?;
        if is_user(&record) {
            // Content of an unexpected shape reads as empty.
            let content = Content::deserialize(&record["message"]["content"]).unwrap_or_default();
            return Ok(Some(content.into_text()));
        }
    }
    Ok(None)
}

fn normalize(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
        .trim()
        .chars()
        .take(MAX_MESSAGE_CHARS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn transcript(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file
    }

    #[test]
    fn string_content() {
        let file = transcript(&[
            r#"{"type":"system","message":{"role":"system","content":"boot"}}"#,
            r#"{"type":"user","message":{"role":"user","content":"  Fix the\nlogin bug  "}}"#,
            r#"{"type":"user","message":{"role":"user","content":"second"}}"#,
        ]);
        assert_eq!(first_user_message(file.path()), "Fix the login bug");
    }

    #[test]
    fn segment_content_keeps_text_only() {
        let file = transcript(&[
            r#"{"type":"user","message":{"role":"user","content":[{"type":"text","text":"hello"},{"type":"image","source":{}},{"type":"text","text":"world"}]}}"#,
        ]);
        assert_eq!(first_user_message(file.path()), "hello world");
    }

    #[test]
    fn stops_before_later_garbage() {
        let file = transcript(&[
            r#"{"type":"assistant","message":{"role":"assistant","content":"hi"}}"#,
            r#"{"type":"user","message":{"role":"user","content":"first"}}"#,
            "this line is not json",
        ]);
        assert_eq!(first_user_message(file.path()), "first");
    }

    #[test]
    fn malformed_record_before_match_is_empty() {
        let file = transcript(&[
            "{not json",
            r#"{"type":"user","message":{"role":"user","content":"never reached"}}"#,
        ]);
        assert_eq!(first_user_message(file.path()), "");
    }

    #[test]
    fn odd_shaped_records_are_skipped() {
        let file = transcript(&[
            r#"{"type":"assistant","message":{"role":"assistant","content":null}}"#,
            r#"{"type":"system","message":"boot notice"}"#,
            r#"{"type":"assistant","message":{"role":"assistant","content":["raw"]}}"#,
            r#"{"type":"user","message":{"role":"user","content":"Fix the login bug"}}"#,
        ]);
        assert_eq!(first_user_message(file.path()), "Fix the login bug");
    }

    #[test]
    fn user_record_with_null_content_is_empty() {
        let file = transcript(&[
            r#"{"type":"user","message":{"role":"user","content":null}}"#,
            r#"{"type":"user","message":{"role":"user","content":"later"}}"#,
        ]);
        assert_eq!(first_user_message(file.path()), "");
    }

    #[test]
    fn no_user_message_is_empty() {
        let file = transcript(&[
            "",
            r#"{"type":"assistant","message":{"role":"assistant","content":"hi"}}"#,
            r#"{"type":"summary","summary":"x"}"#,
        ]);
        assert_eq!(first_user_message(file.path()), "");
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(first_user_message(&dir.path().join("nope.jsonl")), "");
    }

    #[test]
    fn caps_at_two_hundred_chars() {
        let long = "字".repeat(300);
        let line = format!(r#"{{"type":"user","message":{{"role":"user","content":"{long}"}}}}"#);
        let file = transcript(&[&line]);
        assert_eq!(first_user_message(file.path()).chars().count(), 200);
    }
}
