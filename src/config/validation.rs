use crate::config::types::{
    BrowserRenderingConfig, CacheConfig, Config, ReaderConfig, StorageConfig, UserAgentConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_user_agent_config(&config.user_agent)?;
    validate_storage_config(&config.storage)?;
    validate_reader_config(&config.reader)?;
    validate_browser_config(&config.browser_rendering)?;
    validate_cache_config(&config.cache)?;
    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_reader_config(config: &ReaderConfig) -> Result<(), ConfigError> {
    validate_endpoint("reader.endpoint", &config.endpoint)?;

    if config.proxy_region.trim().is_empty() {
        return Err(ConfigError::Validation(
            "reader.proxy_region cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_browser_config(config: &BrowserRenderingConfig) -> Result<(), ConfigError> {
    validate_endpoint("browser_rendering.endpoint", &config.endpoint)?;

    if config.prompt.trim().is_empty() {
        return Err(ConfigError::Validation(
            "browser_rendering.prompt cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// One year
pub(crate) const MAX_CACHE_TTL_SECONDS: u64 = 365 * 24 * 60 * 60;

fn validate_cache_config(config: &CacheConfig) -> Result<(), ConfigError> {
    if config.ttl_seconds < 1 || config.ttl_seconds > MAX_CACHE_TTL_SECONDS {
        return Err(ConfigError::Validation(format!(
            "cache.ttl_seconds must be between 1 and {}, got {}",
            MAX_CACHE_TTL_SECONDS, config.ttl_seconds
        )));
    }
    Ok(())
}

/// Endpoints may be plain http so mock upstreams can stand in for providers
fn validate_endpoint(field: &str, endpoint: &str) -> Result<(), ConfigError> {
    let url = Url::parse(endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, endpoint, e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::Validation(format!(
            "{} must use http or https, got '{}'",
            field,
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "{} has no host: '{}'",
            field, endpoint
        )));
    }

    Ok(())
}
