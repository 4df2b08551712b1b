use crate::config::types::{Config, CrawlerConfig, OutputConfig};
use crate::ConfigError;
use url::Url;

/// Upper bound for the request channel capacity
const MAX_REQUEST_CHANNEL_CAPACITY: usize = 1024;

/// Upper bound for each worker pool
const MAX_WORKERS: usize = 64;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    validate_seed_url(&config.seed_url)?;

    if config.request_channel_capacity < 1
        || config.request_channel_capacity > MAX_REQUEST_CHANNEL_CAPACITY
    {
        return Err(ConfigError::Validation(format!(
            "request_channel_capacity must be between 1 and {}, got {}",
            MAX_REQUEST_CHANNEL_CAPACITY, config.request_channel_capacity
        )));
    }

    for (name, count) in [
        ("fetch_workers", config.fetch_workers),
        ("parse_workers", config.parse_workers),
    ] {
        if count < 1 || count > MAX_WORKERS {
            return Err(ConfigError::Validation(format!(
                "{} must be between 1 and {}, got {}",
                name, MAX_WORKERS, count
            )));
        }
    }

    Ok(())
}

/// Validates that the seed is an absolute HTTP(S) URL
pub fn validate_seed_url(seed: &str) -> Result<(), ConfigError> {
    let url = Url::parse(seed)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "Seed URL '{}' must use HTTP or HTTPS",
            seed
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("content_dir", &config.content_dir),
        ("checkpoint_path", &config.checkpoint_path),
        ("history_path", &config.history_path),
    ] {
        if value.is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    if config.checkpoint_path == config.history_path {
        return Err(ConfigError::Validation(
            "checkpoint_path and history_path must be different files".to_string(),
        ));
    }

    Ok(())
}
