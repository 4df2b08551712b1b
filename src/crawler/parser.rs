//! HTML parse stage
//!
//! Turns fetched page content into a `ParsedPage`:
//! - Text nodes, in document order, as raw text fragments
//! - `<a href>` targets, resolved against the page URL
//!
//! Links that fail to resolve are dropped one at a time. Duplicate links are kept;
//! the frontier controller deduplicates.

use crate::crawler::{PageContent, ParsedPage};
use crate::url::resolve;
use crate::CrawlError;
use scraper::{Html, Node};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use url::Url;

/// Reasons a page can be rejected by the parse stage
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed document at {url}: {reason}")]
    MalformedDocument { url: String, reason: String },

    #[error("page URL {url} is invalid: {source}")]
    InvalidPageUrl {
        url: String,
        source: url::ParseError,
    },
}

/// Parses page content into text fragments and neighbor links
///
/// # Arguments
///
/// * `page` - Raw page content as fetched
///
/// # Returns
///
/// * `Ok(ParsedPage)` - Successfully parsed page
/// * `Err(ParseError)` - The body is not a readable document, or the page URL
///   cannot serve as a base for link resolution
///
/// # Example
///
/// ```
/// use loopcrawl::crawler::{parse_page, PageContent};
///
/// let page = PageContent {
///     url: "https://example.com/docs/".to_string(),
///     body: br#"<p>Hi <a href="intro#top">there</a></p>"#.to_vec(),
/// };
/// let parsed = parse_page(page).unwrap();
/// assert_eq!(parsed.neighbors, vec!["https://example.com/docs/intro"]);
/// assert_eq!(parsed.text, vec!["Hi ", "there"]);
/// ```
pub fn parse_page(page: PageContent) -> Result<ParsedPage, ParseError> {
    let PageContent { url, body } = page;

    let html = match String::from_utf8(body) {
        Ok(html) => html,
        Err(e) => {
            return Err(ParseError::MalformedDocument {
                url,
                reason: format!("body is not valid UTF-8 ({})", e.utf8_error()),
            })
        }
    };
    let document = Html::parse_document(&html);
    if !document.errors.is_empty() {
        tracing::trace!("{}: {} recoverable HTML errors", url, document.errors.len());
    }

    let base = match Url::parse(&url) {
        Ok(base) => base,
        Err(source) => return Err(ParseError::InvalidPageUrl { url, source }),
    };

    let mut text = Vec::new();
    let mut neighbors = Vec::new();

    // descendants() walks the tree depth-first in document order
    for node in document.tree.root().descendants() {
        match node.value() {
            Node::Element(element) if element.name() == "a" => {
                for (name, value) in element.attrs() {
                    if name != "href" {
                        continue;
                    }
                    match resolve(&base, value) {
                        Ok(link) => neighbors.push(link.to_string()),
                        Err(e) => tracing::debug!("Skipping link {:?} on {}: {}", value, url, e),
                    }
                }
            }
            Node::Text(fragment) => text.push(String::from(&**fragment)),
            _ => {}
        }
    }

    Ok(ParsedPage {
        url,
        text,
        neighbors,
    })
}

/// Runs one parse worker until the content channel or the controller closes
///
/// DOM construction runs on the blocking thread pool. A malformed document is
/// skipped unless `halt_on_malformed` is set, in which case it ends the crawl.
pub async fn run_parse_worker(
    id: usize,
    contents: Arc<Mutex<mpsc::Receiver<PageContent>>>,
    parsed: mpsc::UnboundedSender<ParsedPage>,
    halt_on_malformed: bool,
) -> Result<(), CrawlError> {
    tracing::debug!("Parse worker {} started", id);

    loop {
        let content = {
            let mut contents = contents.lock().await;
            contents.recv().await
        };

        let Some(content) = content else {
            tracing::debug!("Parse worker {}: content channel closed", id);
            return Ok(());
        };

        let page = match tokio::task::spawn_blocking(move || parse_page(content)).await? {
            Ok(page) => page,
            Err(ParseError::MalformedDocument { url, reason }) if halt_on_malformed => {
                tracing::error!("Malformed document at {}: {}", url, reason);
                return Err(CrawlError::MalformedDocument { url, reason });
            }
            Err(e) => {
                tracing::warn!("Dropping page: {}", e);
                continue;
            }
        };

        tracing::debug!(
            "Parsed {}: {} text fragments, {} links",
            page.url,
            page.text.len(),
            page.neighbors.len()
        );

        if parsed.send(page).is_err() {
            tracing::debug!("Parse worker {}: controller closed", id);
            return Ok(());
        }
    }
}
