//! Session Identity Persistence
//!
//! The current session id is the only piece of client state that must
//! survive a restart of the consuming surface. It lives behind a small
//! key-value seam so the session layer can be driven with an in-memory
//! double in tests and headless use, and a file-backed store in real
//! surfaces.

use std::fs;
use std::path::PathBuf;

use parking_lot::Mutex;

/// Storage seam for the persisted session id
pub trait SessionIdStore: Send + Sync {
    /// The currently persisted id, if any
    fn get(&self) -> Option<String>;
    /// Persist an id, replacing any previous one
    fn set(&self, id: &str);
    /// Forget the persisted id
    fn clear(&self);
}

/// In-memory store; state dies with the process
#[derive(Debug, Default)]
pub struct MemoryIdStore {
    id: Mutex<Option<String>>,
}

impl MemoryIdStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with an id (useful in tests)
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Mutex::new(Some(id.into())),
        }
    }
}

impl SessionIdStore for MemoryIdStore {
    fn get(&self) -> Option<String> {
        self.id.lock().clone()
    }

    fn set(&self, id: &str) {
        *self.id.lock() = Some(id.to_string());
    }

    fn clear(&self) {
        *self.id.lock() = None;
    }
}

/// File-backed store; survives restarts of the surface
///
/// Storage failures are logged and otherwise ignored: losing the
/// persisted id only costs a fresh session on the next run.
#[derive(Debug)]
pub struct FileIdStore {
    path: PathBuf,
}

impl FileIdStore {
    /// Create a store backed by the given file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default per-application path under the XDG state directory
    ///
    /// Falls back to the local data directory, then the temp directory,
    /// when the platform provides no state directory.
    pub fn default_path(app: &str) -> PathBuf {
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(std::env::temp_dir)
            .join(app)
            .join("session-id")
    }

    /// The file this store reads and writes
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl SessionIdStore for FileIdStore {
    fn get(&self) -> Option<String> {
        let id = fs::read_to_string(&self.path).ok()?;
        let id = id.trim();
        if id.is_empty() {
            return None;
        }
        Some(id.to_string())
    }

    fn set(&self, id: &str) {
        if let Some(parent) = self.path.parent() {
            if let Err(error) = fs::create_dir_all(parent) {
                tracing::warn!(%error, path = ?parent, "failed to create session store directory");
                return;
            }
        }
        if let Err(error) = fs::write(&self.path, id) {
            tracing::warn!(%error, path = ?self.path, "failed to persist session id");
        }
    }

    fn clear(&self) {
        if self.path.exists() {
            if let Err(error) = fs::remove_file(&self.path) {
                tracing::warn!(%error, path = ?self.path, "failed to clear persisted session id");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryIdStore::new();
        assert_eq!(store.get(), None);

        store.set("s1");
        assert_eq!(store.get(), Some("s1".to_string()));

        store.clear();
        assert_eq!(store.get(), None);
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session-id");

        let store = FileIdStore::new(&path);
        assert_eq!(store.get(), None);
        store.set("s42");

        // a fresh store over the same path sees the persisted id
        let reopened = FileIdStore::new(&path);
        assert_eq!(reopened.get(), Some("s42".to_string()));

        reopened.clear();
        assert_eq!(FileIdStore::new(&path).get(), None);
        // clearing an already-clear store is a no-op
        reopened.clear();
    }

    #[test]
    fn test_file_store_ignores_blank_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session-id");
        fs::write(&path, "  \n").unwrap();

        let store = FileIdStore::new(&path);
        assert_eq!(store.get(), None);
    }
}
