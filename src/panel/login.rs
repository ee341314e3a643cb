//! Login handshake
//!
//! # Request Flow
//!
//! 1. GET `/manage.php?{key}={value}` and take `PHPSESSID` from its cookies
//! 2. GET the same URL again presenting `{QINGZHIFU_PATH, PHPSESSID}`
//! 3. Read the numeric id from the POST form action (`.../login/<id>.html`)
//! 4. GET `/Manage/Index/verify.html` for the captcha image
//! 5. Stage the image on disk, read it back, recognize it (exactly 4 characters)
//! 6. POST `{username, password, yzm}` to `/Manage/Index/login/<id>.html`
//! 7. Take `fx_admin_user_CODE` from the response cookies and persist the session
//!
//! Every step needs something only the previous response carries, so nothing is
//! skipped, reordered or retried.

use crate::captcha::{
    is_usable_code, stage_image, CaptchaError, CaptchaResult, CAPTCHA_CODE_LEN,
};
use crate::extract::{find_post_form_action, parse_form_id, ExtractError};
use crate::http::{CookieBundle, PanelResponse};
use crate::panel::envelope::{Envelope, FAILED_MESSAGE};
use crate::panel::{
    login_cookies, Credentials, PanelClient, QueryIdentity, LOGIN_PATH_PREFIX, PROBE_PATH,
    SESSION_COOKIE, USER_CODE_COOKIE, VERIFY_PATH,
};
use crate::state::LoginStep;
use crate::store::PersistedSession;
use crate::{PanelError, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

impl PanelClient {
    /// Logs in and persists the new session
    ///
    /// Never fails: the outcome is reported in the envelope. On success `data` holds
    /// the single `{fx_admin_user_CODE, PHPSESSID}` pair that was persisted.
    pub async fn login(
        &self,
        credentials: &Credentials,
        identity: &QueryIdentity,
    ) -> Envelope<PersistedSession> {
        match self.try_login(credentials, identity).await {
            Ok(session) => {
                info!("Logged in as {}", credentials.username);
                Envelope::success(vec![session])
            }
            Err(e) => {
                warn!("Login failed: {}", e);
                Envelope::failure(login_failure_message(&e))
            }
        }
    }

    /// Runs the login handshake, returning the persisted session
    pub async fn try_login(
        &self,
        credentials: &Credentials,
        identity: &QueryIdentity,
    ) -> Result<PersistedSession> {
        let http = self.open_session()?;
        let probe_url = self.url(PROBE_PATH);
        let probe_query = [(identity.key.clone(), identity.value.clone())];

        debug!(step = %LoginStep::Probe, "GET {}", probe_url);
        let probe = http
            .get(&probe_url, &probe_query, &CookieBundle::new())
            .await?;
        let session_id = probe
            .cookie(SESSION_COOKIE)
            .map(str::to_string)
            .or_else(|| http.stored_cookie(probe.url.as_str(), SESSION_COOKIE))
            .ok_or(PanelError::MissingField {
                step: LoginStep::Probe,
                field: "PHPSESSID cookie",
            })?;
        let cookies = login_cookies(&session_id);

        debug!(step = %LoginStep::Reprobe, "GET {} with session cookie", probe_url);
        let page = http.get(&probe_url, &probe_query, &cookies).await?;

        let form_id = login_form_id(&page)?;
        debug!(step = %LoginStep::LoginForm, "Login form id {}", form_id);

        debug!(step = %LoginStep::Verify, "Fetching captcha");
        let verify = http.get(&self.url(VERIFY_PATH), &[], &cookies).await?;
        if verify.body.is_empty() {
            return Err(PanelError::MissingField {
                step: LoginStep::Verify,
                field: "captcha image",
            });
        }

        let code = self.solve_captcha(verify.body).await?;
        debug!(step = %LoginStep::Captcha, "Captcha recognized");

        let login_url = self.url(&format!("{}{}.html", LOGIN_PATH_PREFIX, form_id));
        debug!(step = %LoginStep::Submit, "POST {}", login_url);
        let form = [
            ("username", credentials.username.as_str()),
            ("password", credentials.password.as_str()),
            ("yzm", code.as_str()),
        ];
        let response = http.post_form(&login_url, &form, &cookies).await?;

        // A redirect after the POST leaves the cookie in the jar, not on the final response
        let user_code = response
            .cookie(USER_CODE_COOKIE)
            .map(str::to_string)
            .or_else(|| http.stored_cookie(response.url.as_str(), USER_CODE_COOKIE))
            .ok_or(PanelError::MissingField {
                step: LoginStep::Submit,
                field: "fx_admin_user_CODE cookie",
            })?;

        let session = PersistedSession::new(user_code, session_id);
        debug!(step = %LoginStep::Persist, "Saving session");
        self.store.save(&session)?;

        Ok(session)
    }

    /// Stages the captcha image in a scoped file and recognizes it
    ///
    /// Staging and recognition run on the blocking pool. The file is removed before
    /// recognition starts, whatever happens.
    async fn solve_captcha(&self, image: Vec<u8>) -> Result<String> {
        let scratch_dir = self.scratch_dir.clone();
        let solver = Arc::clone(&self.solver);

        let task = tokio::task::spawn_blocking(move || -> CaptchaResult<String> {
            let staged = stage_image(&scratch_dir, &image)?;
            solver.classify(&staged)
        });
        let code = task.await.map_err(|e| {
            CaptchaError::Recognizer(format!("captcha task did not finish: {}", e))
        })??;

        if !is_usable_code(&code) {
            return Err(PanelError::ValidationFailed(format!(
                "captcha code has {} characters, expected {}",
                code.chars().count(),
                CAPTCHA_CODE_LEN
            )));
        }

        Ok(code)
    }
}

/// Finds the login form id on the reprobe page
fn login_form_id(page: &PanelResponse) -> Result<String> {
    if page.body.is_empty() {
        return Err(PanelError::MissingField {
            step: LoginStep::Reprobe,
            field: "response body",
        });
    }

    let action = find_post_form_action(&page.text()).map_err(|e| match e {
        ExtractError::MissingAttribute { .. } => PanelError::MissingField {
            step: LoginStep::LoginForm,
            field: "form action",
        },
        _ => PanelError::MissingField {
            step: LoginStep::LoginForm,
            field: "POST form",
        },
    })?;

    parse_form_id(&action).ok_or(PanelError::PatternMismatch { value: action })
}

/// Envelope message for a failed login
fn login_failure_message(error: &PanelError) -> String {
    if error.is_transport() {
        format!("failed, error: {}", error)
    } else {
        FAILED_MESSAGE.to_string()
    }
}
