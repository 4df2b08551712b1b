//! Append-only crawl history
//!
//! One JSON line per parsed page: when it was merged, its URL, its text fragments
//! and its neighbor list. The history is a record of what was crawled; it is never
//! read back to resume a crawl.

use crate::crawler::ParsedPage;
use crate::storage::traits::{StorageError, StorageResult};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct HistoryRecord<'a> {
    crawled_at: String,
    url: &'a str,
    text: &'a [String],
    neighbors: &'a [String],
}

/// Handle to the crawl history log, opened once per process
#[derive(Debug)]
pub struct CrawlHistory {
    path: PathBuf,
    writer: BufWriter<File>,
    records: u64,
}

impl CrawlHistory {
    /// Opens the log for appending, creating it (and its directory) if needed
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| StorageError::io(&path, e))?;

        Ok(Self {
            path,
            writer: BufWriter::new(file),
            records: 0,
        })
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of records appended through this handle
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Appends one record and flushes it to the file
    pub fn append(&mut self, page: &ParsedPage) -> StorageResult<()> {
        let record = HistoryRecord {
            crawled_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            url: &page.url,
            text: &page.text,
            neighbors: &page.neighbors,
        };

        serde_json::to_writer(&mut self.writer, &record)?;
        self.writer
            .write_all(b"\n")
            .and_then(|()| self.writer.flush())
            .map_err(|e| StorageError::io(&self.path, e))?;

        self.records += 1;
        Ok(())
    }

    /// Flushes and syncs the log; the handle is consumed
    pub fn close(mut self) -> StorageResult<()> {
        self.writer
            .flush()
            .map_err(|e| StorageError::io(&self.path, e))?;
        self.writer
            .get_ref()
            .sync_all()
            .map_err(|e| StorageError::io(&self.path, e))?;
        tracing::debug!(
            "Closed crawl history {} after {} records",
            self.path.display(),
            self.records
        );
        Ok(())
    }
}
