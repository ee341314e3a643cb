//! Panel workflows
//!
//! This module contains the three public operations against the panel:
//! - `login`: the probe / captcha / submit handshake that creates a session
//! - `check_login_status`: replays a stored session and checks it is accepted
//! - `fetch_report`: validates the session, then scrapes one report page
//!
//! Each operation has a `try_*` form returning a typed `PanelError` and an
//! envelope form that never fails.

mod envelope;
mod login;
mod report;
mod validator;

pub use envelope::{DataPage, Envelope, ReportExtras, FAILED_MESSAGE, SUCCESS_MESSAGE};

use crate::captcha::{CaptchaSolver, CommandSolver};
use crate::config::{Config, HttpConfig};
use crate::http::{CookieBundle, HttpSession};
use crate::store::{FileSessionStore, PersistedSession, SessionStore, StoreError};
use crate::PanelError;
use std::path::PathBuf;
use std::sync::Arc;

/// Probe endpoint handing out the session cookie
pub const PROBE_PATH: &str = "/manage.php";

/// Endpoint serving the captcha image
pub const VERIFY_PATH: &str = "/Manage/Index/verify.html";

/// Prefix of the login endpoint; the form id and `.html` follow
pub const LOGIN_PATH_PREFIX: &str = "/Manage/Index/login/";

/// Page only an authenticated admin can load
pub const MAIN_PATH: &str = "/manage/main/index.html";

/// Constant site-path cookie the panel expects on every request
pub const SITE_PATH_COOKIE: (&str, &str) = ("QINGZHIFU_PATH", "qingzhifu");

/// Session id cookie handed out by the probe
pub const SESSION_COOKIE: &str = "PHPSESSID";

/// Cookie carrying the session id on authenticated requests
pub const AUTH_SESSION_COOKIE: &str = "JSESSIONID";

/// User-code cookie set by a successful login
pub const USER_CODE_COOKIE: &str = "fx_admin_user_CODE";

/// Admin name cookie
pub const ADMIN_NAME_COOKIE: &str = "fx_admin_user_UNAME";

/// Admin id cookie
pub const ADMIN_ID_COOKIE: &str = "fx_admin_user_UID";

/// Menu flag cookie, always `0`
pub const MENU_COOKIE: (&str, &str) = ("menudd", "0");

/// Login credentials; never persisted
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// The query pair appended to the probe URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryIdentity {
    pub key: String,
    pub value: String,
}

impl QueryIdentity {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Admin identity presented in authenticated cookies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminIdentity {
    pub name: String,
    pub id: String,
}

impl AdminIdentity {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }
}

/// Cookies sent during the login handshake
pub fn login_cookies(session_id: &str) -> CookieBundle {
    CookieBundle::new()
        .with(SITE_PATH_COOKIE.0, SITE_PATH_COOKIE.1)
        .with(SESSION_COOKIE, session_id)
}

/// Cookies sent on authenticated requests
pub fn authenticated_cookies(session: &PersistedSession, admin: &AdminIdentity) -> CookieBundle {
    CookieBundle::new()
        .with(AUTH_SESSION_COOKIE, session.session_id.as_str())
        .with(SITE_PATH_COOKIE.0, SITE_PATH_COOKIE.1)
        .with(ADMIN_NAME_COOKIE, admin.name.as_str())
        .with(MENU_COOKIE.0, MENU_COOKIE.1)
        .with(ADMIN_ID_COOKIE, admin.id.as_str())
        .with(USER_CODE_COOKIE, session.user_code.as_str())
}

/// Client for one panel
///
/// Holds the HTTP settings, the session store and the captcha solver. Each
/// operation opens its own `HttpSession`, so cookies never leak between operations,
/// and runs its requests strictly one at a time.
pub struct PanelClient {
    base_url: String,
    http: HttpConfig,
    store: Arc<dyn SessionStore>,
    solver: Arc<dyn CaptchaSolver>,
    scratch_dir: PathBuf,
}

impl PanelClient {
    /// Creates a client for the panel at `base_url`
    ///
    /// Captcha images are staged in the working directory unless
    /// `with_scratch_dir` says otherwise.
    pub fn new(
        base_url: impl Into<String>,
        http: HttpConfig,
        store: Arc<dyn SessionStore>,
        solver: Arc<dyn CaptchaSolver>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            http,
            store,
            solver,
            scratch_dir: PathBuf::from("."),
        }
    }

    /// Builds a client wired the way the config describes
    pub fn from_config(config: &Config) -> Self {
        let store = Arc::new(FileSessionStore::new(config.session.directory.clone()));
        let solver = Arc::new(CommandSolver::from_config(&config.captcha));

        Self::new(
            config.site.base_url.clone(),
            config.http.clone(),
            store,
            solver,
        )
        .with_scratch_dir(config.captcha.scratch_dir.clone())
    }

    /// Sets the directory for the short-lived captcha image
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Opens a session with an empty cookie jar
    fn open_session(&self) -> Result<HttpSession, PanelError> {
        HttpSession::new(&self.http).map_err(|source| PanelError::Transport {
            url: self.base_url.clone(),
            source,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Loads the stored session, naming the missing entry on failure
    fn load_session(&self) -> Result<PersistedSession, PanelError> {
        self.store.load().map_err(|e| match e {
            StoreError::Missing(entry) | StoreError::Empty(entry) => {
                PanelError::StorageMissing { entry }
            }
            other => PanelError::Store(other),
        })
    }
}
