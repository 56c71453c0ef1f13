//! Configuration validation logic.

use regex::Regex;

use crate::config::loader::{Config, PacingConfig, MAX_PAUSE_SECS};
use crate::error::{Error, Result};

/// Minimum username length.
const MIN_USERNAME_LENGTH: usize = 3;

/// Maximum username length.
const MAX_USERNAME_LENGTH: usize = 20;

/// Largest page size the listing endpoints accept.
const MAX_PAGE_SIZE: u32 = 50;

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_credential("client_id", &config.account.client_id)?;
    validate_credential("client_secret", &config.account.client_secret)?;
    validate_username(&config.account.username)?;
    validate_pacing(&config.pacing)?;
    validate_base_url(&config.api.base_url)?;

    if let Some(tagger_url) = &config.options.tagger_url {
        url::Url::parse(tagger_url).map_err(|e| Error::ConfigValidation {
            field: "tagger_url".to_string(),
            message: format!("'{}' is not a valid URL: {}", tagger_url, e),
        })?;
    }

    Ok(())
}

/// Validate a client credential value.
pub fn validate_credential(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::MissingConfig(field.to_string()));
    }

    // Check for placeholder values
    let lower = value.to_lowercase();
    if lower.contains("replaceme") || lower.contains("your_client") {
        return Err(Error::ConfigValidation {
            field: field.to_string(),
            message: format!(
                "{} appears to be a placeholder. Use the values of your registered application.",
                field
            ),
        });
    }

    Ok(())
}

/// Validate the account username whose follows are mirrored.
pub fn validate_username(username: &str) -> Result<()> {
    if username.is_empty() {
        return Err(Error::MissingConfig("username".to_string()));
    }

    // Remove leading @ if present
    let clean_username = username.trim_start_matches('@');

    if clean_username.len() < MIN_USERNAME_LENGTH || clean_username.len() > MAX_USERNAME_LENGTH {
        return Err(Error::ConfigValidation {
            field: "username".to_string(),
            message: format!(
                "Username '{}' must be between {} and {} characters",
                username, MIN_USERNAME_LENGTH, MAX_USERNAME_LENGTH
            ),
        });
    }

    let username_pattern =
        Regex::new(r"^[a-zA-Z0-9_-]+$").map_err(|e| Error::Config(e.to_string()))?;

    if !username_pattern.is_match(clean_username) {
        return Err(Error::ConfigValidation {
            field: "username".to_string(),
            message: format!(
                "Username '{}' contains invalid characters. Only alphanumeric, hyphens, and underscores allowed.",
                username
            ),
        });
    }

    let lower = clean_username.to_lowercase();
    if lower == "replaceme" || lower == "username" || lower.starts_with("your_") {
        return Err(Error::ConfigValidation {
            field: "username".to_string(),
            message: format!("Username '{}' appears to be a placeholder.", username),
        });
    }

    Ok(())
}

/// Validate sleep, retry and page-size tunables.
pub fn validate_pacing(pacing: &PacingConfig) -> Result<()> {
    if pacing.max_retries == 0 {
        return Err(Error::ConfigValidation {
            field: "max_retries".to_string(),
            message: "At least one attempt per request is required".to_string(),
        });
    }

    if !pacing.sleep_time_secs.is_finite()
        || pacing.sleep_time_secs < 0.0
        || pacing.sleep_time_secs > MAX_PAUSE_SECS as f64
    {
        return Err(Error::ConfigValidation {
            field: "sleep_time_secs".to_string(),
            message: format!(
                "Sleep time must be between 0 and {} seconds (got {})",
                MAX_PAUSE_SECS, pacing.sleep_time_secs
            ),
        });
    }

    if pacing.rate_limit_sleep_secs > MAX_PAUSE_SECS {
        return Err(Error::ConfigValidation {
            field: "rate_limit_sleep_secs".to_string(),
            message: format!(
                "Rate-limit sleep must be at most {} seconds (got {})",
                MAX_PAUSE_SECS, pacing.rate_limit_sleep_secs
            ),
        });
    }

    if pacing.page_size == 0 || pacing.page_size > MAX_PAGE_SIZE {
        return Err(Error::ConfigValidation {
            field: "page_size".to_string(),
            message: format!(
                "Page size must be between 1 and {} (got {})",
                MAX_PAGE_SIZE, pacing.page_size
            ),
        });
    }

    if pacing.request_timeout_secs == 0 {
        return Err(Error::ConfigValidation {
            field: "request_timeout_secs".to_string(),
            message: "Request timeout must be at least one second".to_string(),
        });
    }

    if pacing.asset_timeout_secs == 0 {
        return Err(Error::ConfigValidation {
            field: "asset_timeout_secs".to_string(),
            message: "Asset timeout must be at least one second".to_string(),
        });
    }

    Ok(())
}

fn validate_base_url(base_url: &str) -> Result<()> {
    let parsed = url::Url::parse(base_url)?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(Error::ConfigValidation {
            field: "base_url".to_string(),
            message: format!("Unsupported scheme '{}'", parsed.scheme()),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.account.client_id = "12345".to_string();
        config.account.client_secret = "0123456789abcdef".to_string();
        config.account.username = "watcher".to_string();
        config
    }

    #[test]
    fn test_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_missing_credentials() {
        let mut config = valid_config();
        config.account.client_secret.clear();
        assert!(matches!(
            validate_config(&config),
            Err(Error::MissingConfig(field)) if field == "client_secret"
        ));
    }

    #[test]
    fn test_placeholder_credential() {
        assert!(validate_credential("client_id", "REPLACEME").is_err());
    }

    #[test]
    fn test_example_config_is_rejected_until_filled_in() {
        let config: Config = toml::from_str(include_str!("../../config.example.toml")).unwrap();
        assert!(matches!(
            validate_config(&config),
            Err(Error::ConfigValidation { .. })
        ));

        let mut config = config;
        config.account.client_id = "12345".to_string();
        config.account.client_secret = "0123456789abcdef".to_string();
        assert!(matches!(
            validate_config(&config),
            Err(Error::ConfigValidation { field, .. }) if field == "username"
        ));
    }

    #[test]
    fn test_valid_username() {
        assert!(validate_username("valid_user123").is_ok());
        assert!(validate_username("@user-name").is_ok());
    }

    #[test]
    fn test_invalid_username() {
        assert!(validate_username("ab").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username("username").is_err());
        assert!(validate_username("your_username").is_err());
        assert!(validate_username("Your_Name").is_err());
    }

    #[test]
    fn test_pacing_bounds() {
        let mut pacing = PacingConfig::default();
        assert!(validate_pacing(&pacing).is_ok());

        pacing.max_retries = 0;
        assert!(validate_pacing(&pacing).is_err());

        pacing = PacingConfig::default();
        pacing.sleep_time_secs = -1.0;
        assert!(validate_pacing(&pacing).is_err());

        pacing = PacingConfig::default();
        pacing.sleep_time_secs = 1e300;
        assert!(validate_pacing(&pacing).is_err());

        pacing = PacingConfig::default();
        pacing.rate_limit_sleep_secs = u64::MAX;
        assert!(validate_pacing(&pacing).is_err());

        pacing = PacingConfig::default();
        pacing.asset_timeout_secs = 0;
        assert!(validate_pacing(&pacing).is_err());

        pacing = PacingConfig::default();
        pacing.page_size = 51;
        assert!(validate_pacing(&pacing).is_err());
    }

    #[test]
    fn test_invalid_tagger_url() {
        let mut config = valid_config();
        config.options.tagger_url = Some("not a url".to_string());
        assert!(validate_config(&config).is_err());
    }
}
