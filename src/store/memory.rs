//! In-memory session store

use crate::store::traits::{
    PersistedSession, SessionStore, StoreError, StoreResult, SESSION_ID_ENTRY, USER_CODE_ENTRY,
};
use std::sync::Mutex;

/// Session store that keeps everything in process memory
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    user_code: Mutex<Option<String>>,
    session_id: Mutex<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store already holding `session`
    pub fn with_session(session: PersistedSession) -> Self {
        Self {
            user_code: Mutex::new(Some(session.user_code)),
            session_id: Mutex::new(Some(session.session_id)),
        }
    }
}

fn lock(slot: &Mutex<Option<String>>) -> std::sync::MutexGuard<'_, Option<String>> {
    // A poisoned slot still holds a plain string
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn read_slot(slot: &Mutex<Option<String>>, entry: &str) -> StoreResult<String> {
    match lock(slot).as_deref() {
        None => Err(StoreError::Missing(entry.to_string())),
        Some(value) if value.trim().is_empty() => Err(StoreError::Empty(entry.to_string())),
        Some(value) => Ok(value.to_string()),
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> StoreResult<PersistedSession> {
        Ok(PersistedSession {
            user_code: read_slot(&self.user_code, USER_CODE_ENTRY)?,
            session_id: read_slot(&self.session_id, SESSION_ID_ENTRY)?,
        })
    }

    fn save(&self, session: &PersistedSession) -> StoreResult<()> {
        *lock(&self.user_code) = Some(session.user_code.clone());
        *lock(&self.session_id) = Some(session.session_id.clone());
        Ok(())
    }
}
