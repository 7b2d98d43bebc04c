use crate::config::types::{BrowserConfig, Config, ServiceConfig, SiteConfig, StorageConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_browser_config(&config.browser)?;
    validate_storage_config(&config.storage)?;
    validate_service_config(&config.service)?;
    Ok(())
}

/// Validates the listing site root
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.root_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid root-url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "root-url '{}' must use http or https",
            config.root_url
        )));
    }

    if url.query().is_some() || url.fragment().is_some() {
        return Err(ConfigError::InvalidUrl(format!(
            "root-url '{}' must not carry a query or fragment",
            config.root_url
        )));
    }

    Ok(())
}

/// Validates browser session settings
fn validate_browser_config(config: &BrowserConfig) -> Result<(), ConfigError> {
    if config.navigation_timeout_ms < 1_000 {
        return Err(ConfigError::Validation(format!(
            "navigation-timeout-ms must be >= 1000ms, got {}ms",
            config.navigation_timeout_ms
        )));
    }

    if config.idle_time_ms >= config.navigation_timeout_ms {
        return Err(ConfigError::Validation(format!(
            "idle-time-ms ({}ms) must be shorter than navigation-timeout-ms ({}ms)",
            config.idle_time_ms, config.navigation_timeout_ms
        )));
    }

    if let Some(agent) = &config.user_agent {
        if agent.trim().is_empty() {
            return Err(ConfigError::Validation(
                "user-agent cannot be blank".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates storage settings
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the session pool bounds
fn validate_service_config(config: &ServiceConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_crawls < 1 || config.max_concurrent_crawls > 64 {
        return Err(ConfigError::Validation(format!(
            "max-concurrent-crawls must be between 1 and 64, got {}",
            config.max_concurrent_crawls
        )));
    }

    Ok(())
}
