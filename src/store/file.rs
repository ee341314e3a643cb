//! Flat-file session store
//!
//! Two plain-text files in one directory, read whole and overwritten whole.

use crate::store::traits::{
    PersistedSession, SessionStore, StoreError, StoreResult, SESSION_ID_ENTRY, USER_CODE_ENTRY,
};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Session store backed by `fx_admin_user_CODE.txt` and `PHPSESSID.txt`
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    directory: PathBuf,
}

impl FileSessionStore {
    /// Creates a store rooted at `directory`
    ///
    /// The directory is not created; writes fail if it does not exist.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Path of the user-code file
    pub fn user_code_path(&self) -> PathBuf {
        self.directory.join(USER_CODE_ENTRY)
    }

    /// Path of the session id file
    pub fn session_id_path(&self) -> PathBuf {
        self.directory.join(SESSION_ID_ENTRY)
    }

    fn read_entry(path: &Path, entry: &str) -> StoreResult<String> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::Missing(entry.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        let value = content.trim();
        if value.is_empty() {
            return Err(StoreError::Empty(entry.to_string()));
        }
        Ok(value.to_string())
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> StoreResult<PersistedSession> {
        let user_code = Self::read_entry(&self.user_code_path(), USER_CODE_ENTRY)?;
        let session_id = Self::read_entry(&self.session_id_path(), SESSION_ID_ENTRY)?;
        Ok(PersistedSession {
            user_code,
            session_id,
        })
    }

    fn save(&self, session: &PersistedSession) -> StoreResult<()> {
        std::fs::write(self.user_code_path(), &session.user_code)?;
        std::fs::write(self.session_id_path(), &session.session_id)?;
        tracing::debug!("Session written to {}", self.directory.display());
        Ok(())
    }
}
