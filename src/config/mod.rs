//! Configuration module
//!
//! Loads, parses, and validates the optional TOML configuration file. Without a
//! file the crawler runs on built-in defaults.
//!
//! # Example
//!
//! ```no_run
//! use loopcrawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("loopcrawl.toml")).unwrap();
//! println!("Fetch workers: {}", config.crawler.fetch_workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, OutputConfig, DEFAULT_REQUEST_CHANNEL_CAPACITY, DEFAULT_SEED_URL,
};

// Re-export parser functions
pub use parser::{load_config, load_config_or_default, parse_config};
pub use validation::{validate, validate_seed_url};
