//! Session validation
//!
//! A stored session counts as valid only when the admin main page answers with
//! `Cache-Control: private`. Any other value, a missing header, or a transport
//! failure means the session is not usable. This heuristic mirrors how the panel
//! behaves today and breaks silently if the panel changes its caching headers.

use crate::panel::envelope::{Envelope, FAILED_MESSAGE};
use crate::panel::{authenticated_cookies, AdminIdentity, PanelClient, MAIN_PATH};
use crate::store::PersistedSession;
use crate::{PanelError, Result};
use tracing::{debug, info, warn};

/// Header inspected to tell a live session from a dead one
pub const VALIDITY_HEADER: &str = "Cache-Control";

/// Header value sent only to authenticated admins
pub const VALID_SESSION_MARKER: &str = "private";

/// Envelope message for a session the panel did not accept
pub const SESSION_REJECTED_MESSAGE: &str = "login failed , please check your username and password";

impl PanelClient {
    /// Checks whether the stored session is still accepted
    ///
    /// On success `data` holds the stored `{fx_admin_user_CODE, PHPSESSID}` pair.
    pub async fn check_login_status(&self, admin: &AdminIdentity) -> Envelope<PersistedSession> {
        match self.try_check_login_status(admin).await {
            Ok(session) => {
                info!("Stored session is valid");
                Envelope::success(vec![session])
            }
            Err(e) => {
                warn!("Stored session is not usable: {}", e);
                Envelope::failure(status_failure_message(&e))
            }
        }
    }

    /// Replays the stored session against the admin main page
    pub async fn try_check_login_status(&self, admin: &AdminIdentity) -> Result<PersistedSession> {
        let session = self.load_session()?;
        let cookies = authenticated_cookies(&session, admin);

        let url = self.url(MAIN_PATH);
        debug!("Validating session against {}", url);
        let response = self.open_session()?.get(&url, &[], &cookies).await?;

        let marker = response.header(VALIDITY_HEADER);
        if !is_valid_session_marker(marker) {
            debug!("{} was {:?}", VALIDITY_HEADER, marker);
            return Err(PanelError::SessionRejected);
        }

        Ok(session)
    }
}

/// Returns true only for a header exactly equal to `private`
pub fn is_valid_session_marker(value: Option<&str>) -> bool {
    value == Some(VALID_SESSION_MARKER)
}

/// Envelope message for a failed validation
fn status_failure_message(error: &PanelError) -> String {
    match error {
        PanelError::StorageMissing { entry } => format!("{} not found", entry),
        PanelError::SessionRejected => SESSION_REJECTED_MESSAGE.to_string(),
        e if e.is_transport() => format!("error: {}", e),
        _ => FAILED_MESSAGE.to_string(),
    }
}
