//! Output module for reporting on crawl state
//!
//! This module handles:
//! - Summarizing a saved checkpoint
//! - Printing crawl statistics

pub mod stats;

pub use stats::{load_statistics, print_statistics, CrawlStatistics};
