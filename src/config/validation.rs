use crate::config::types::{Config, HttpConfig, ReportConfig, SiteConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_http_config(&config.http)?;
    if let Some(report) = &config.report {
        validate_report_config(report)?;
    }
    if config.captcha.command.trim().is_empty() {
        return Err(ConfigError::Validation(
            "captcha command cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates the panel location
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "base-url '{}' must use http or https",
            config.base_url
        )));
    }

    if url.query().is_some() || url.fragment().is_some() {
        return Err(ConfigError::Validation(format!(
            "base-url '{}' must not carry a query or fragment",
            config.base_url
        )));
    }

    if config.query_key.is_empty() {
        return Err(ConfigError::Validation(
            "query-key cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates HTTP client settings
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.timeout_secs < 1 || config.timeout_secs > 120 {
        return Err(ConfigError::Validation(format!(
            "timeout-secs must be between 1 and 120, got {}",
            config.timeout_secs
        )));
    }

    if config.max_redirects > 20 {
        return Err(ConfigError::Validation(format!(
            "max-redirects must be <= 20, got {}",
            config.max_redirects
        )));
    }

    Ok(())
}

/// Validates the default report page
fn validate_report_config(config: &ReportConfig) -> Result<(), ConfigError> {
    if !config.path.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "report path must start with '/', got '{}'",
            config.path
        )));
    }
    Ok(())
}
