//! Storage module for persisting crawl data
//!
//! This module handles everything the crawler writes to disk:
//! - Raw page content, mirrored under a host/path hierarchy
//! - The frontier checkpoint used to resume a crawl
//! - The append-only crawl history log

mod checkpoint;
mod content;
mod history;
mod traits;

pub use checkpoint::CheckpointStore;
pub use content::{FsContentStore, DEFAULT_FILE_NAME};
pub use history::CrawlHistory;
pub use traits::{ContentSink, StorageError, StorageResult};
