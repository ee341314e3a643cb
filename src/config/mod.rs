//! Configuration module for Easypay-Panel
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use easypay_panel::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("panel.toml")).unwrap();
//! println!("Panel lives at: {}", config.site.base_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    AccountConfig, CaptchaConfig, Config, HttpConfig, ReportConfig, SessionConfig, SiteConfig,
};

// Re-export parser functions
pub use parser::{load_config, parse_config};
