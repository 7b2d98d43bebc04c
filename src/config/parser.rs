use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use feedback_crawler::config::load_config;
///
/// let config = load_config(Path::new("feedback-crawler.toml")).unwrap();
/// println!("Database: {}", config.storage.database_path);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from a TOML string
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// The hash is stored with every crawl run so runs made under different
/// settings can be told apart.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AdmissionPolicy, EngineKind};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[site]
root-url = "https://congtytui1.com"

[browser]
engine = "http"
idle-time-ms = 250
navigation-timeout-ms = 10000
user-agent = "FeedbackCrawler/1.0"

[storage]
database-path = "./test.db"

[service]
max-concurrent-crawls = 4
admission = "reject"
per-slug-lock = true
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.site.root_url, "https://congtytui1.com");
        assert_eq!(config.browser.engine, EngineKind::Http);
        assert_eq!(config.browser.idle_time_ms, 250);
        assert_eq!(
            config.browser.user_agent.as_deref(),
            Some("FeedbackCrawler/1.0")
        );
        assert_eq!(config.storage.database_path, "./test.db");
        assert_eq!(config.service.max_concurrent_crawls, 4);
        assert_eq!(config.service.admission, AdmissionPolicy::Reject);
        assert!(config.service.per_slug_lock);
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config = parse_config(
            r#"
[site]
root-url = "https://congtytui1.com"
"#,
        )
        .unwrap();

        assert_eq!(config.browser.engine, EngineKind::Chromium);
        assert!(config.browser.no_sandbox);
        assert_eq!(config.browser.idle_time_ms, 500);
        assert_eq!(config.browser.navigation_timeout_ms, 30_000);
        assert_eq!(config.storage.database_path, "./feedback.db");
        assert_eq!(config.service.max_concurrent_crawls, 2);
        assert_eq!(config.service.admission, AdmissionPolicy::Queue);
        assert!(!config.service.per_slug_lock);
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_site_section_is_rejected() {
        let result = parse_config("[storage]\ndatabase-path = \"./x.db\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_unknown_engine_is_rejected() {
        let result = parse_config(
            r#"
[site]
root-url = "https://congtytui1.com"

[browser]
engine = "firefox"
"#,
        );
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let config_content = r#"
[site]
root-url = "https://congtytui1.com"

[service]
max-concurrent-crawls = 0
"#;

        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }
}
