//! Session store module
//!
//! Persists the `{user code, session id}` pair produced by a successful login and
//! hands it back to every later validation or report fetch. Backends:
//! - `FileSessionStore`: two flat files, whole-file read and overwrite
//! - `MemorySessionStore`: process memory, for tests and embedding

mod file;
mod memory;
mod traits;

pub use file::FileSessionStore;
pub use memory::MemorySessionStore;
pub use traits::{
    PersistedSession, SessionStore, StoreError, StoreResult, SESSION_ID_ENTRY, USER_CODE_ENTRY,
};
