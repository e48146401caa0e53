use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// Credentials missing from the file are filled from the environment
/// (`JINA_API_KEY`, `CF_ACCOUNT_ID`, `CF_API_TOKEN`).
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use page_harvest::config::load_config;
///
/// let config = load_config(Path::new("harvest.toml")).unwrap();
/// println!("Database: {}", config.storage.database_path);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content, |key| std::env::var(key).ok())
}

/// Parses configuration text, resolving absent credentials through `lookup`
pub fn parse_config<F>(content: &str, lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config: Config = toml::from_str(content)?;

    apply_credential_fallbacks(&mut config, lookup);

    validate(&config)?;

    Ok(config)
}

fn apply_credential_fallbacks<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    fn fill<F: Fn(&str) -> Option<String>>(slot: &mut Option<String>, key: &str, lookup: &F) {
        if slot.as_deref().map_or(true, str::is_empty) {
            *slot = lookup(key).filter(|v| !v.is_empty());
        }
    }

    fill(&mut config.reader.api_key, "JINA_API_KEY", &lookup);
    fill(&mut config.browser_rendering.account_id, "CF_ACCOUNT_ID", &lookup);
    fill(&mut config.browser_rendering.api_token, "CF_API_TOKEN", &lookup);
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so runs against different settings can be told apart.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}
