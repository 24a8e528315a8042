//! Windows transport — WinRT toast through PowerShell.
//!
//! The toast XML is built here with every text field XML-escaped, then
//! shipped to PowerShell as `-EncodedCommand` so no command-line quoting
//! rules apply. A link becomes a protocol activation, which Windows
//! routes to the registered URI handler on click.

use base64::prelude::*;

use super::NotificationRequest;
use super::sink::{NotificationSink, NotifyError, run};

pub struct ToastSink {
    app_id: String,
    scheme: String,
}

impl ToastSink {
    pub fn new(app_id: &str, scheme: &str) -> Self {
        Self {
            app_id: app_id.to_string(),
            scheme: scheme.to_string(),
        }
    }

    /// Toast XML payload. Sound is played separately, so the toast is silent.
    pub fn toast_xml(&self, request: &NotificationRequest) -> String {
        let body = if request.subtitle.is_empty() {
            request.body.clone()
        } else {
            format!("{}\n{}", request.subtitle, request.body)
        };
        let activation = match &request.link {
            Some(link) => format!(
                r#" activationType="protocol" launch="{}""#,
                escape_xml(&link.to_uri(&self.scheme))
            ),
            None => String::new(),
        };
        format!(
            concat!(
                "<toast{activation}>",
                r#"<visual><binding template="ToastGeneric">"#,
                "<text>{title}</text><text>{body}</text>",
                "</binding></visual>",
                r#"<audio silent="true"/>"#,
                "</toast>"
            ),
            activation = activation,
            title = escape_xml(&request.title),
            body = escape_xml(&body),
        )
    }

    /// PowerShell script that registers the app id (idempotent) and shows
    /// the toast.
    pub fn script(&self, request: &NotificationRequest) -> String {
        format!(
            r#"$appId = '{app_id}'
$regPath = 'HKCU:\Software\Classes\AppUserModelId\' + $appId
if (-not (Test-Path $regPath)) {{
    New-Item -Path $regPath -Force | Out-Null
    New-ItemProperty -Path $regPath -Name 'DisplayName' -Value $appId -PropertyType String -Force | Out-Null
}}
[Windows.UI.Notifications.ToastNotificationManager, Windows.UI.Notifications, ContentType = WindowsRuntime] | Out-Null
[Windows.Data.Xml.Dom.XmlDocument, Windows.Data.Xml.Dom, ContentType = WindowsRuntime] | Out-Null
$doc = New-Object Windows.Data.Xml.Dom.XmlDocument
$doc.LoadXml('{xml}')
$toast = [Windows.UI.Notifications.ToastNotification]::new($doc)
[Windows.UI.Notifications.ToastNotificationManager]::CreateToastNotifier($appId).Show($toast)
"#,
            app_id = escape_ps_single(&self.app_id),
            xml = escape_ps_single(&self.toast_xml(request)),
        )
    }
}

impl NotificationSink for ToastSink {
    async fn deliver(&self, request: &NotificationRequest) -> Result<(), NotifyError> {
        let args = [
            "-NoProfile".to_string(),
            "-NonInteractive".to_string(),
            "-EncodedCommand".to_string(),
            encode_command(&self.script(request)),
        ];
        run("powershell", &args).await.map(drop)
    }
}

/// XML text/attribute escaping. Control characters other than newline
/// are not legal XML 1.0 and become spaces.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\n' => out.push('\n'),
            c if c.is_control() => out.push(' '),
            c => out.push(c),
        }
    }
    out
}

/// Escape for a PowerShell single-quoted string: `'` doubles.
fn escape_ps_single(text: &str) -> String {
    text.replace('\'', "''")
}

/// `-EncodedCommand` wants base64 of the UTF-16LE script.
fn encode_command(script: &str) -> String {
    let bytes: Vec<u8> = script.encode_utf16().flat_map(u16::to_le_bytes).collect();
    BASE64_STANDARD.encode(bytes)
}
