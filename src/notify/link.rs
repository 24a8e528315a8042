//! Activation link — `<scheme>://activate?pid=<int>&cwd=<percent-encoded>`.

use std::fmt;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use url::Url;

/// Everything but RFC 3986 unreserved characters gets encoded.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

const ACTION: &str = "activate";

/// Reference to a terminal window that survives the trip through the OS
/// notification center. The pid may be stale by the time it comes back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationLink {
    pub pid: u32,
    pub cwd: String,
}

impl ActivationLink {
    pub fn new(pid: u32, cwd: impl Into<String>) -> Self {
        Self {
            pid,
            cwd: cwd.into(),
        }
    }

    /// Encode as a URI under `scheme`.
    pub fn to_uri(&self, scheme: &str) -> String {
        format!(
            "{scheme}://{ACTION}?pid={}&cwd={}",
            self.pid,
            utf8_percent_encode(&self.cwd, QUERY_VALUE)
        )
    }

    /// Decode a URI. Missing or non-integer `pid` yields `None`; a missing
    /// `cwd` decodes as empty.
    pub fn parse(uri: &str) -> Option<Self> {
        let url = Url::parse(uri.trim()).ok()?;
        if let Some(host) = url.host_str()
            && host != ACTION
        {
            tracing::debug!(host, "activation link with unexpected action");
        }

        let mut pid = None;
        let mut cwd = String::new();
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "pid" if pid.is_none() => pid = Some(value.trim().parse::<u32>().ok()?),
                "cwd" => cwd = value.into_owned(),
                _ => {}
            }
        }

        Some(Self { pid: pid?, cwd })
    }

    /// Base name of `cwd`, used to pick among a terminal's windows.
    pub fn keyword(&self) -> Option<&str> {
        self.cwd
            .trim_end_matches(['/', '\\'])
            .rsplit(['/', '\\'])
            .next()
            .filter(|name| !name.is_empty())
    }
}

impl fmt::Display for ActivationLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pid={} cwd={}", self.pid, self.cwd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_cwd() {
        let link = ActivationLink::new(12345, "/home/u/my project&co");
        assert_eq!(
            link.to_uri("session-notifier"),
            "session-notifier://activate?pid=12345&cwd=%2Fhome%2Fu%2Fmy%20project%26co"
        );
    }

    #[test]
    fn decodes_what_it_encodes() {
        for cwd in ["/home/u/my-project", r"C:\Users\u\新项目", "/tmp/a+b c=d?e#f", ""] {
            let link = ActivationLink::new(42, cwd);
            assert_eq!(ActivationLink::parse(&link.to_uri("x-notify")), Some(link));
        }
    }

    #[test]
    fn pid_is_required() {
        assert_eq!(ActivationLink::parse("x://activate?cwd=%2Ftmp"), None);
        assert_eq!(ActivationLink::parse("x://activate?pid=abc"), None);
        assert_eq!(ActivationLink::parse("x://activate?pid=-3"), None);
        assert_eq!(ActivationLink::parse("x://activate?pid="), None);
        assert_eq!(ActivationLink::parse("not a uri"), None);
        assert_eq!(ActivationLink::parse(""), None);
    }

    #[test]
    fn cwd_is_optional() {
        let link = ActivationLink::parse("x://activate?pid=7").unwrap();
        assert_eq!(link, ActivationLink::new(7, ""));
        assert_eq!(link.keyword(), None);
    }

    #[test]
    fn keyword_is_base_name() {
        assert_eq!(ActivationLink::new(1, "/home/u/my-project").keyword(), Some("my-project"));
        assert_eq!(ActivationLink::new(1, "/home/u/my-project/").keyword(), Some("my-project"));
        assert_eq!(ActivationLink::new(1, r"C:\src\app").keyword(), Some("app"));
        assert_eq!(ActivationLink::new(1, "/").keyword(), None);
    }
}
