//! Session naming — cache, remote summary, local summary, directory name.

pub mod cache;
pub mod remote;
pub mod summarize;
pub mod transcript;

use std::path::Path;

use cache::LabelCache;
use remote::Summarizer;

/// Label of last resort when even the working directory is unknown.
const FALLBACK_LABEL: &str = "session";

/// Resolves the display label for a session.
pub struct SessionNamer<R> {
    cache: LabelCache,
    remote: R,
}

impl<R: Summarizer> SessionNamer<R> {
    pub fn new(cache: LabelCache, remote: R) -> Self {
        Self { cache, remote }
    }

    /// Return a non-empty label for the session.
    ///
    /// First hit wins: cached label, remote summary of the first user
    /// message, local summary of it, then the base name of `cwd`. Fresh
    /// summaries are cached; a failed cache write is logged and ignored.
    pub async fn name(&self, transcript_path: Option<&Path>, session_id: &str, cwd: &Path) -> String {
        if let Some(label) = self.cache.get(session_id) {
            tracing::debug!(session_id, label = %label, "label cache hit");
            return label;
        }

        let first_message = transcript_path
            .map(transcript::first_user_message)
            .unwrap_or_default();

        let mut label = None;
        if !first_message.is_empty() {
            label = self
                .remote
                .summarize(&first_message)
                .await
                .filter(|l| !l.trim().is_empty());
            if label.is_none() {
                label = Some(summarize::summarize(&first_message)).filter(|l| !l.is_empty());
            }
        }

        match label {
            Some(label) => {
                if !session_id.is_empty()
                    && let Err(e) = self.cache.put(session_id, &label)
                {
                    tracing::warn!(session_id, error = %e, "failed to cache session label");
                }
                label
            }
            None => directory_label(cwd),
        }
    }
}

/// Base name of `cwd`, or the whole path when it has none.
fn directory_label(cwd: &Path) -> String {
    if let Some(name) = cwd.file_name() {
        return name.to_string_lossy().into_owned();
    }
    let whole = cwd.to_string_lossy();
    if whole.trim().is_empty() {
        FALLBACK_LABEL.to_string()
    } else {
        whole.into_owned()
    }
}
