//! Runtime configuration, resolved once at startup.
//!
//! Priority for the cache directory: `--cache-dir` flag (or its env var,
//! via clap) > platform cache dir > `~/.cache`. Everything else comes from
//! the environment.

use std::path::PathBuf;

/// Directory name under the per-user cache root, and default URI scheme.
pub const APP_NAME: &str = "session-notifier";

const DEFAULT_APP_ID: &str = "Session.Notifier";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MODEL: &str = "claude-3-haiku-20240307";

/// Credentials and endpoint for the remote summarizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    pub base_url: String,
    /// Sent as a bearer token.
    pub auth_token: Option<String>,
    /// Sent as `x-api-key`.
    pub api_key: Option<String>,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub cache_dir: PathBuf,
    pub uri_scheme: String,
    /// Windows AppUserModelId used for toasts.
    pub app_id: String,
    /// `None` when no credentials are present or remote naming is disabled.
    pub remote: Option<RemoteConfig>,
}

impl Config {
    /// Resolve from the process environment.
    pub fn from_env(cache_dir: Option<PathBuf>) -> Self {
        Self::resolve(cache_dir, |key| std::env::var(key).ok())
    }

    fn resolve(cache_dir: Option<PathBuf>, env: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| env(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let cache_dir = cache_dir.unwrap_or_else(default_cache_dir);
        let uri_scheme = var("SESSION_NOTIFIER_SCHEME").unwrap_or_else(|| APP_NAME.to_string());
        let app_id = var("SESSION_NOTIFIER_APP_ID").unwrap_or_else(|| DEFAULT_APP_ID.to_string());

        let offline = var("SESSION_NOTIFIER_OFFLINE").is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));
        let auth_token = var("ANTHROPIC_AUTH_TOKEN");
        let api_key = var("ANTHROPIC_API_KEY");

        // Any credential is enough to try; failures fall through later.
        let remote = (!offline && (auth_token.is_some() || api_key.is_some())).then(|| RemoteConfig {
            base_url: var("ANTHROPIC_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            auth_token,
            api_key,
            model: var("SESSION_NOTIFIER_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        });

        Self {
            cache_dir,
            uri_scheme,
            app_id,
            remote,
        }
    }
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".cache")))
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_NAME)
}
