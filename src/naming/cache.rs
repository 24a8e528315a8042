//! Per-session label cache — one plain-text file per session id.

use std::path::{Path, PathBuf};

/// Cache write failure.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("session id {0:?} is not usable as a file name")]
    InvalidKey(String),
    #[error("write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Label store rooted at a per-user cache directory.
///
/// No locking: concurrent hooks for the same session may both write, and
/// the last rename wins. Writes go through a temp file so readers never
/// observe a partial label.
#[derive(Debug, Clone)]
pub struct LabelCache {
    dir: PathBuf,
}

impl LabelCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Cached label for `session_id`. Missing, unreadable or blank
    /// entries are all a miss.
    pub fn get(&self, session_id: &str) -> Option<String> {
        let path = self.entry_path(session_id)?;
        let label = std::fs::read_to_string(&path).ok()?;
        let label = label.trim();
        (!label.is_empty()).then(|| label.to_string())
    }

    /// Persist `label` for `session_id`, replacing any previous entry.
    pub fn put(&self, session_id: &str, label: &str) -> Result<(), CacheError> {
        let path = self
            .entry_path(session_id)
            .ok_or_else(|| CacheError::InvalidKey(session_id.to_string()))?;

        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| CacheError::Io { path, source }
        };

        std::fs::create_dir_all(&self.dir).map_err(io_err(&self.dir))?;
        let tmp_path = self
            .dir
            .join(format!(".{session_id}.{}.tmp", std::process::id()));
        std::fs::write(&tmp_path, label).map_err(io_err(&tmp_path))?;
        std::fs::rename(&tmp_path, &path).map_err(|source| {
            let _ = std::fs::remove_file(&tmp_path);
            CacheError::Io { path: path.clone(), source }
        })
    }

    /// Session ids become file names, so anything that could escape the
    /// cache directory (or hide as a dotfile) is refused.
    fn entry_path(&self, session_id: &str) -> Option<PathBuf> {
        let valid = !session_id.is_empty()
            && !session_id.starts_with('.')
            && session_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        valid.then(|| self.dir.join(session_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LabelCache::new(dir.path().join("nested"));

        assert_eq!(cache.get("abc-123"), None);
        cache.put("abc-123", "修复登录").unwrap();
        assert_eq!(cache.get("abc-123").as_deref(), Some("修复登录"));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("nested/abc-123")).unwrap(),
            "修复登录"
        );
    }

    #[test]
    fn overwrite_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LabelCache::new(dir.path());
        cache.put("s1", "first").unwrap();
        cache.put("s1", "second").unwrap();
        assert_eq!(cache.get("s1").as_deref(), Some("second"));
    }

    #[test]
    fn blank_entry_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("s1"), "  \n").unwrap();
        let cache = LabelCache::new(dir.path());
        assert_eq!(cache.get("s1"), None);
    }

    #[test]
    fn hostile_ids_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LabelCache::new(dir.path().join("cache"));
        for id in ["", "../escape", "a/b", ".hidden", "..", "a\\b"] {
            assert!(matches!(cache.put(id, "x"), Err(CacheError::InvalidKey(_))), "{id:?}");
            assert_eq!(cache.get(id), None);
        }
        assert!(!dir.path().join("escape").exists());
    }

    #[test]
    fn unwritable_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "not a dir").unwrap();
        let cache = LabelCache::new(&blocker);
        assert!(matches!(cache.put("s1", "x"), Err(CacheError::Io { .. })));
    }
}
