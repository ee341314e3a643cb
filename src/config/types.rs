use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Default per-request timeout, in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Default number of redirect hops followed per request
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Main configuration structure for Easypay-Panel
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    pub account: AccountConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub captcha: CaptchaConfig,
    #[serde(default)]
    pub report: Option<ReportConfig>,
}

/// Target panel location and the probe query pair
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Panel root, without trailing path (e.g. "http://panel.example.com")
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Key of the query pair appended to the probe URL
    #[serde(rename = "query-key")]
    pub query_key: String,

    /// Value of the query pair appended to the probe URL
    #[serde(rename = "query-value")]
    pub query_value: String,
}

/// Login credentials and the admin identity shown in cookies
#[derive(Clone, Deserialize)]
pub struct AccountConfig {
    pub username: String,

    pub password: String,

    #[serde(rename = "admin-name")]
    pub admin_name: String,

    #[serde(rename = "admin-id")]
    pub admin_id: String,
}

impl std::fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("admin_name", &self.admin_name)
            .field("admin_id", &self.admin_id)
            .finish()
    }
}

/// HTTP client behavior
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum redirect hops followed for a single request
    #[serde(rename = "max-redirects", default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Optional User-Agent header value
    #[serde(rename = "user-agent", default)]
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            user_agent: None,
        }
    }
}

/// Where the persisted session files live
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_dir")]
    pub directory: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            directory: default_dir(),
        }
    }
}

/// External OCR program used to read the captcha
#[derive(Debug, Clone, Deserialize)]
pub struct CaptchaConfig {
    /// Program that reads image bytes on stdin and prints the code on stdout
    #[serde(default = "default_captcha_command")]
    pub command: String,

    #[serde(default)]
    pub args: Vec<String>,

    /// Directory for the short-lived captcha image file
    #[serde(rename = "scratch-dir", default = "default_dir")]
    pub scratch_dir: PathBuf,
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self {
            command: default_captcha_command(),
            args: Vec::new(),
            scratch_dir: default_dir(),
        }
    }
}

/// Default report page for the `report` command
#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// Path appended to the base URL (e.g. "/manage/dingdan/index.html")
    pub path: String,

    /// Query parameters sent with the report request
    #[serde(default)]
    pub query: BTreeMap<String, String>,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_redirects() -> usize {
    DEFAULT_MAX_REDIRECTS
}

fn default_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_captcha_command() -> String {
    "ddddocr".to_string()
}
