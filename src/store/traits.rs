//! Session store traits and error types
//!
//! This module defines the trait interface for session store backends and
//! associated error types.

use serde::Serialize;
use thiserror::Error;

/// Name of the entry holding the user-code token
pub const USER_CODE_ENTRY: &str = "fx_admin_user_CODE.txt";

/// Name of the entry holding the session id
pub const SESSION_ID_ENTRY: &str = "PHPSESSID.txt";

/// Errors that can occur during session store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    Missing(String),

    #[error("{0} is empty")]
    Empty(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for session store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// A session as handed out by a successful login
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistedSession {
    /// Value of the `fx_admin_user_CODE` cookie
    #[serde(rename = "fx_admin_user_CODE")]
    pub user_code: String,

    /// Value of the `PHPSESSID` cookie
    #[serde(rename = "PHPSESSID")]
    pub session_id: String,
}

impl PersistedSession {
    pub fn new(user_code: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            user_code: user_code.into(),
            session_id: session_id.into(),
        }
    }
}

/// Trait for session store backends
///
/// There is no locking: concurrent writers race and the last one wins.
pub trait SessionStore: Send + Sync {
    /// Loads the stored session
    ///
    /// Fails with `StoreError::Missing` naming the absent entry, or
    /// `StoreError::Empty` when an entry exists but holds nothing.
    fn load(&self) -> StoreResult<PersistedSession>;

    /// Overwrites the stored session
    fn save(&self, session: &PersistedSession) -> StoreResult<()>;
}

impl<S: SessionStore + ?Sized> SessionStore for std::sync::Arc<S> {
    fn load(&self) -> StoreResult<PersistedSession> {
        (**self).load()
    }

    fn save(&self, session: &PersistedSession) -> StoreResult<()> {
        (**self).save(session)
    }
}
