//! Keeps the session between runs as a small JSON file.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use shared::domain::Session;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct TokenStore {
    path: Option<PathBuf>,
}

impl TokenStore {
    /// A store without a path never persists anything.
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// A missing or unreadable file means no stored session.
    pub fn load(&self) -> Option<Session> {
        let path = self.path.as_ref()?;
        let raw = fs::read_to_string(path).ok()?;
        match serde_json::from_str::<Session>(&raw) {
            Ok(session) => Some(session),
            Err(error) => {
                warn!(path = %path.display(), %error, "ignoring unreadable token file");
                None
            }
        }
    }

    pub fn save(&self, session: &Session) -> anyhow::Result<()> {
        let Some(path) = self.path.as_ref() else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create token directory '{}'", parent.display())
            })?;
        }
        let raw = serde_json::to_string(session)?;
        fs::write(path, raw)
            .with_context(|| format!("failed to write token file '{}'", path.display()))?;
        debug!(path = %path.display(), "session stored");
        Ok(())
    }

    pub fn clear(&self) -> anyhow::Result<()> {
        let Some(path) = self.path.as_ref() else {
            return Ok(());
        };
        match fs::remove_file(path) {
            Ok(()) => {
                debug!(path = %path.display(), "session removed");
                Ok(())
            }
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error)
                .with_context(|| format!("failed to remove token file '{}'", path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        env,
        time::{SystemTime, UNIX_EPOCH},
    };

    use super::*;

    fn temp_store() -> (TokenStore, PathBuf) {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let root = env::temp_dir().join(format!("product_console_token_test_{suffix}"));
        (TokenStore::new(Some(root.join("nested").join("token"))), root)
    }

    #[test]
    fn round_trips_session_and_creates_parent_dir() {
        let (store, root) = temp_store();
        assert!(store.load().is_none());

        let session = Session::new("abc");
        store.save(&session).expect("save");
        assert_eq!(store.load(), Some(session));

        store.clear().expect("clear");
        assert!(store.load().is_none());
        store.clear().expect("clear twice");
        fs::remove_dir_all(root).expect("cleanup");
    }

    #[test]
    fn garbage_file_reads_as_no_session() {
        let (store, root) = temp_store();
        let path = store.path().expect("path").to_path_buf();
        fs::create_dir_all(path.parent().expect("parent")).expect("dir");
        fs::write(&path, "not json").expect("write");
        assert!(store.load().is_none());
        fs::remove_dir_all(root).expect("cleanup");
    }

    #[test]
    fn pathless_store_is_inert() {
        let store = TokenStore::new(None);
        store.save(&Session::new("abc")).expect("save");
        assert!(store.load().is_none());
        store.clear().expect("clear");
    }
}
