//! loopcrawl: a resumable single-process web crawler
//!
//! Pages flow through a closed loop of pipeline stages: the frontier controller
//! dispatches crawl requests, fetch workers download and store pages, parse workers
//! extract text and outbound links, and the controller merges newly discovered
//! links back into its queue. The frontier is checkpointed on shutdown so the next
//! run picks up exactly where this one stopped.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for crawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Malformed document at {url}: {reason}")]
    MalformedDocument { url: String, reason: String },

    #[error("The {0} stage is no longer running")]
    StageClosed(&'static str),

    #[error("Pipeline task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
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

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("javascript: reference rejected: {0}")]
    SchemeRejected(String),

    #[error("Unsupported scheme {scheme} in {url}; only http and https links are followed")]
    UnsupportedScheme { url: String, scheme: String },
}

// Re-export commonly used types
pub use config::Config;
pub use state::FrontierState;
pub use crate::url::resolve;
