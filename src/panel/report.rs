//! Report fetching
//!
//! `Unvalidated -> Validating -> Fetching -> Succeeded`, with `Failed` reachable
//! from every non-terminal state. No step is retried.

use crate::extract::{parse_report, ReportPage, ReportRow};
use crate::panel::envelope::{Envelope, FAILED_MESSAGE};
use crate::panel::{authenticated_cookies, AdminIdentity, PanelClient};
use crate::state::FetchState;
use crate::{PanelError, Result};
use tracing::{debug, info, warn};

/// Envelope message when the stored session is not accepted
pub const NOT_LOGGED_IN_MESSAGE: &str = "login failed";

impl PanelClient {
    /// Validates the stored session, then fetches and parses one report page
    ///
    /// `path` is appended to the base URL and `query` sent as URL parameters. On
    /// success the envelope carries the table rows in `data`, the summary groups in
    /// `data_top` and the pagination info in `data_page`.
    pub async fn fetch_report(
        &self,
        path: &str,
        query: &[(String, String)],
        admin: &AdminIdentity,
    ) -> Envelope<ReportRow> {
        match self.try_fetch_report(path, query, admin).await {
            Ok(page) => {
                info!("Fetched {} report rows from {}", page.rows.len(), path);
                Envelope::report(page)
            }
            Err(e) => {
                warn!("Report fetch failed: {}", e);
                Envelope::failure(report_failure_message(&e))
            }
        }
    }

    /// Validates the stored session, then fetches and parses one report page
    pub async fn try_fetch_report(
        &self,
        path: &str,
        query: &[(String, String)],
        admin: &AdminIdentity,
    ) -> Result<ReportPage> {
        let mut state = FetchState::Unvalidated;
        let outcome = self.run_fetch(&mut state, path, query, admin).await;

        let last = if outcome.is_ok() {
            FetchState::Succeeded
        } else {
            FetchState::Failed
        };
        state.advance(last);

        outcome
    }

    async fn run_fetch(
        &self,
        state: &mut FetchState,
        path: &str,
        query: &[(String, String)],
        admin: &AdminIdentity,
    ) -> Result<ReportPage> {
        state.advance(FetchState::Validating);
        self.try_check_login_status(admin)
            .await
            .map_err(|e| PanelError::NotLoggedIn(Box::new(e)))?;

        // Read again: the files may have changed since validation
        let session = self.load_session()?;
        let cookies = authenticated_cookies(&session, admin);

        state.advance(FetchState::Fetching);
        let url = self.url(path);
        debug!("GET {} ({} query params)", url, query.len());
        let response = self.open_session()?.get(&url, query, &cookies).await?;

        parse_report(&response.text()).map_err(|e| PanelError::Html {
            url,
            message: e.to_string(),
        })
    }
}

/// Envelope message for a failed report fetch
fn report_failure_message(error: &PanelError) -> String {
    match error {
        PanelError::NotLoggedIn(_) => NOT_LOGGED_IN_MESSAGE.to_string(),
        e if e.is_transport() => format!("error : {}", e),
        _ => FAILED_MESSAGE.to_string(),
    }
}
