//! Easypay-Panel: session automation for a single Easypay admin panel
//!
//! This crate logs into the panel (solving its image CAPTCHA), keeps the resulting
//! session in two flat files, checks whether a stored session is still accepted, and
//! scrapes one report page into rows, summary widgets and pagination info.

pub mod captcha;
pub mod config;
pub mod extract;
pub mod http;
pub mod panel;
pub mod state;
pub mod store;

use thiserror::Error;

/// Main error type for panel operations
///
/// Every variant collapses to the same `{result: false, message, data: []}` envelope
/// at the public boundary; inside the crate the variants keep the causes apart.
#[derive(Debug, Error)]
pub enum PanelError {
    #[error("HTTP error for {url}: {source}")]
    Transport { url: String, source: reqwest::Error },

    #[error("Too many redirects from {url}")]
    RedirectLimit { url: String },

    #[error("Redirect loop detected at {url}")]
    RedirectLoop { url: String },

    #[error("Missing {field} during {step}")]
    MissingField {
        step: state::LoginStep,
        field: &'static str,
    },

    #[error("Value {value:?} does not match the expected pattern")]
    PatternMismatch { value: String },

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("{entry} not found")]
    StorageMissing { entry: String },

    #[error("Session rejected by the panel")]
    SessionRejected,

    #[error("Not logged in: {0}")]
    NotLoggedIn(#[source] Box<PanelError>),

    #[error("HTML parse error for {url}: {message}")]
    Html { url: String, message: String },

    #[error("Captcha error: {0}")]
    Captcha(#[from] captcha::CaptchaError),

    #[error("Session store error: {0}")]
    Store(#[from] store::StoreError),

    #[error("URL parse error: {0}")]
    Url(#[from] ::url::ParseError),
}

impl PanelError {
    /// Returns true for failures of the transport itself (connection, timeout, redirects)
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::RedirectLimit { .. } | Self::RedirectLoop { .. }
        )
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for panel operations
pub type Result<T> = std::result::Result<T, PanelError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use captcha::{CaptchaSolver, CommandSolver};
pub use config::Config;
pub use panel::{AdminIdentity, Credentials, Envelope, PanelClient, QueryIdentity};
pub use store::{FileSessionStore, MemorySessionStore, PersistedSession, SessionStore};
