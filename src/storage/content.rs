//! Filesystem content store
//!
//! Pages are written to `<root>/<host>/<path>`. A path that ends in `/` names a
//! directory, so its content goes to a file called `__default` inside it.
//!
//! The same name can be both a page and a directory (`/docs` and `/docs/`, or
//! `/wiki/AC` and `/wiki/AC/DC`). Whenever that happens the name becomes a
//! directory and the page stored under it moves to its `__default` file.

use crate::storage::traits::{ContentSink, StorageError, StorageResult};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use url::Url;

/// File name used for URLs whose path ends in a separator
pub const DEFAULT_FILE_NAME: &str = "__default";

/// Suffix of the temporary name a page file takes while it is moved below a
/// directory of the same name
const RELOCATING_SUFFIX: &str = ".relocating";

/// Content sink that mirrors the host/path hierarchy on disk
#[derive(Debug)]
pub struct FsContentStore {
    root: PathBuf,
    // Serializes layout changes between concurrent fetch workers
    layout: Mutex<()>,
}

impl FsContentStore {
    /// Creates a store rooted at `root`; directories are created lazily
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            layout: Mutex::new(()),
        }
    }

    /// Maps a URL to the file its content is stored in
    pub fn content_path(&self, url: &str) -> StorageResult<PathBuf> {
        let parsed = Url::parse(url).map_err(|_| StorageError::InvalidUrl(url.to_string()))?;
        let host = parsed
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| StorageError::InvalidUrl(url.to_string()))?;

        let mut path = self.root.join(host);
        let url_path = parsed.path();

        // Path segments of a parsed http(s) URL never contain "." or "..", so
        // joining them cannot escape the host directory
        for segment in url_path.split('/').filter(|s| !s.is_empty()) {
            path.push(segment);
        }

        if url_path.is_empty() || url_path.ends_with('/') {
            path.push(DEFAULT_FILE_NAME);
        }

        Ok(path)
    }
}

/// Makes every directory between `root` and `path` exist
///
/// A page file sitting where a directory is needed is moved to `__default`
/// inside the new directory.
fn ensure_parent_dirs(root: &Path, path: &Path) -> StorageResult<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    let relative = parent.strip_prefix(root).unwrap_or(parent);

    let mut current = root.to_path_buf();
    for component in relative.components() {
        current.push(component);
        if current.is_file() {
            demote_to_default(&current)?;
        }
    }

    fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))
}

/// Turns the page file at `path` into a directory holding it as `__default`
fn demote_to_default(path: &Path) -> StorageResult<()> {
    let mut temporary = path.as_os_str().to_owned();
    temporary.push(RELOCATING_SUFFIX);
    let temporary = PathBuf::from(temporary);

    fs::rename(path, &temporary).map_err(|e| StorageError::io(path, e))?;
    fs::create_dir(path).map_err(|e| StorageError::io(path, e))?;

    let target = path.join(DEFAULT_FILE_NAME);
    fs::rename(&temporary, &target).map_err(|e| StorageError::io(&target, e))?;

    tracing::debug!("Moved {} to {}", path.display(), target.display());
    Ok(())
}

impl ContentSink for FsContentStore {
    fn store(&self, url: &str, body: &[u8]) -> StorageResult<()> {
        let mut path = self.content_path(url)?;
        let _layout = self.layout.lock().unwrap_or_else(|e| e.into_inner());

        ensure_parent_dirs(&self.root, &path)?;
        if path.is_dir() {
            path.push(DEFAULT_FILE_NAME);
        }

        fs::write(&path, body).map_err(|e| StorageError::io(&path, e))?;
        tracing::trace!("Stored {} bytes for {} at {}", body.len(), url, path.display());

        Ok(())
    }
}
