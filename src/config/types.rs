use serde::Deserialize;

/// Seed address used when no checkpoint exists and none is configured
pub const DEFAULT_SEED_URL: &str = "https://en.wikipedia.org/wiki/Keebler_Company";

/// Default capacity of the controller → fetch request channel
pub const DEFAULT_REQUEST_CHANNEL_CAPACITY: usize = 4;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Address the crawl starts from when there is no checkpoint to resume
    #[serde(rename = "seed-url")]
    pub seed_url: String,

    /// Number of crawl requests that may wait for a fetch worker
    #[serde(rename = "request-channel-capacity")]
    pub request_channel_capacity: usize,

    /// Number of concurrent fetch workers
    #[serde(rename = "fetch-workers")]
    pub fetch_workers: usize,

    /// Number of concurrent parse workers
    #[serde(rename = "parse-workers")]
    pub parse_workers: usize,

    /// Per-request timeout in seconds (0 disables the timeout)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Stop the whole crawl on a malformed document instead of skipping the page
    #[serde(rename = "halt-on-malformed-document")]
    pub halt_on_malformed_document: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            seed_url: DEFAULT_SEED_URL.to_string(),
            request_channel_capacity: DEFAULT_REQUEST_CHANNEL_CAPACITY,
            fetch_workers: 1,
            parse_workers: 1,
            request_timeout_secs: 30,
            halt_on_malformed_document: false,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Root directory of the raw page content store
    #[serde(rename = "content-dir")]
    pub content_dir: String,

    /// Path to the frontier checkpoint file
    #[serde(rename = "checkpoint-path")]
    pub checkpoint_path: String,

    /// Path to the append-only crawl history log
    #[serde(rename = "history-path")]
    pub history_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            content_dir: "content".to_string(),
            checkpoint_path: "crawl_state.json".to_string(),
            history_path: "crawl_history.log".to_string(),
        }
    }
}
