//! Statistics from a saved checkpoint
//!
//! This module provides functionality for summarizing the crawl frontier that
//! the last run left behind.

use crate::state::FrontierState;
use crate::storage::CheckpointStore;
use crate::CrawlError;

/// Frontier statistics summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// URLs waiting to be dispatched
    pub waiting: usize,

    /// URLs ever queued
    pub seen: usize,

    /// URLs that left the queue (fetched, in flight at shutdown, or dropped)
    pub dispatched: usize,

    /// The URL the next run dispatches first
    pub next_url: Option<String>,
}

impl CrawlStatistics {
    /// Summarizes a frontier
    pub fn from_frontier(state: &FrontierState) -> Self {
        Self {
            waiting: state.waiting_len(),
            seen: state.seen_len(),
            dispatched: state.seen_len().saturating_sub(state.waiting_len()),
            next_url: state.peek_next().map(str::to_string),
        }
    }
}

/// Loads statistics from the checkpoint
///
/// # Returns
///
/// * `Ok(Some(CrawlStatistics))` - A checkpoint exists
/// * `Ok(None)` - There is no checkpoint yet
/// * `Err(CrawlError)` - The checkpoint is corrupt
pub fn load_statistics(checkpoints: &CheckpointStore) -> Result<Option<CrawlStatistics>, CrawlError> {
    Ok(checkpoints
        .load()?
        .map(|state| CrawlStatistics::from_frontier(&state)))
}

/// Prints statistics to stdout
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");
    println!("URLs seen:       {}", stats.seen);
    println!("URLs dispatched: {}", stats.dispatched);
    println!("URLs waiting:    {}", stats.waiting);

    match &stats.next_url {
        Some(url) => println!("\nNext URL: {}", url),
        None => println!("\nFrontier is empty"),
    }
}
