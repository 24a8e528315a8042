//! Remote session naming via the Anthropic Messages API.
//!
//! Best-effort: every failure (network, auth, empty or malformed reply)
//! is logged and becomes "no label", and naming falls through to the
//! local summarizer.

use std::time::Duration;

use crate::config::RemoteConfig;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_TOKENS: u32 = 20;

/// Characters trimmed from both ends of a model reply.
const REPLY_TRIM: &[char] = &['"', '\'', '、', '。', '！', '.', ',', '!'];

#[derive(Debug, thiserror::Error)]
pub enum SummaryError {
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),
    #[error("api status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("reply carried no text")]
    Empty,
}

/// Text in, short label out.
#[allow(async_fn_in_trait)]
pub trait Summarizer {
    async fn summarize(&self, text: &str) -> Option<String>;
}

/// Summarizer backed by the Anthropic Messages API.
pub struct AnthropicSummarizer {
    client: reqwest::Client,
    config: RemoteConfig,
}

impl AnthropicSummarizer {
    pub fn new(config: RemoteConfig) -> Result<Self, SummaryError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client, config })
    }

    async fn request(&self, text: &str) -> Result<String, SummaryError> {
        let url = format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'));
        let body = serde_json::json!({
            "model": self.config.model,
            "max_tokens": MAX_TOKENS,
            "messages": [{
                "role": "user",
                "content": format!(
                    "Summarize the task in 6 words or less. Output only the summary, no punctuation or quotes:\n{text}"
                ),
            }],
        });

        let mut req = self
            .client
            .post(&url)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body);
        req = if let Some(token) = &self.config.auth_token {
            req.bearer_auth(token)
        } else {
            req.header("x-api-key", self.config.api_key.as_deref().unwrap_or_default())
        };

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SummaryError::Status { status, body });
        }

        let json: serde_json::Value = resp.json().await?;
        let label = clean_reply(json["content"][0]["text"].as_str().unwrap_or(""));
        if label.is_empty() {
            return Err(SummaryError::Empty);
        }
        Ok(label)
    }
}

impl Summarizer for AnthropicSummarizer {
    async fn summarize(&self, text: &str) -> Option<String> {
        match self.request(text).await {
            Ok(label) => {
                tracing::debug!(label = %label, "remote summary");
                Some(label)
            }
            Err(e) => {
                tracing::debug!(error = %e, "remote summary failed");
                None
            }
        }
    }
}

/// The remote summarizer, if credentials allow one.
pub enum RemoteSummarizer {
    Anthropic(AnthropicSummarizer),
    Disabled,
}

impl RemoteSummarizer {
    pub fn from_config(config: Option<&RemoteConfig>) -> Self {
        let Some(config) = config else {
            return Self::Disabled;
        };
        match AnthropicSummarizer::new(config.clone()) {
            Ok(summarizer) => Self::Anthropic(summarizer),
            Err(e) => {
                tracing::warn!(error = %e, "remote summarizer unavailable");
                Self::Disabled
            }
        }
    }
}

impl Summarizer for RemoteSummarizer {
    async fn summarize(&self, text: &str) -> Option<String> {
        match self {
            Self::Anthropic(summarizer) => summarizer.summarize(text).await,
            Self::Disabled => None,
        }
    }
}

fn clean_reply(reply: &str) -> String {
    reply.trim().trim_matches(REPLY_TRIM).trim().to_string()
}
