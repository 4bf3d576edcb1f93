//! Persisted bearer token.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{CoreError, Result};

/// Stores the admin bearer token in a file between invocations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    /// Creates a store backed by `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the token. A missing or blank file means no session.
    pub fn load(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CoreError::token_storage(&self.path, e.to_string())),
        }
    }

    /// Writes the token, creating parent directories.
    pub fn save(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| CoreError::token_storage(&self.path, e.to_string()))?;
        }
        std::fs::write(&self.path, token.trim())
            .map_err(|e| CoreError::token_storage(&self.path, e.to_string()))?;
        debug!(path = %self.path.display(), "Token saved");
        Ok(())
    }

    /// Removes the token. Clearing an absent token succeeds.
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "Token cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CoreError::token_storage(&self.path, e.to_string())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_save_load_clear() {
        let dir = std::env::temp_dir().join("test_quizdesk_session/nested");
        let store = TokenStore::new(dir.join("token"));

        assert_eq!(store.load().unwrap(), None);
        store.save("abc.def\n").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("abc.def"));
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        store.clear().unwrap();

        std::fs::remove_dir_all(std::env::temp_dir().join("test_quizdesk_session")).ok();
    }

    #[test]
    fn test_blank_file_means_no_token() {
        let path = std::env::temp_dir().join("test_quizdesk_blank_token");
        std::fs::write(&path, "  \n").unwrap();
        assert_eq!(TokenStore::new(&path).load().unwrap(), None);
        std::fs::remove_file(&path).ok();
    }
}
