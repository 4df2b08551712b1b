//! HTTP fetch stage
//!
//! Fetch workers take crawl requests off the bounded request channel, download
//! the page, hand the raw body to the content sink, and forward it to the parse
//! stage. A request that fails in transport is logged and dropped; it is never
//! retried.

use crate::crawler::{CrawlRequest, PageContent};
use crate::storage::ContentSink;
use crate::CrawlError;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};

/// Reasons a single fetch can fail
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport { url: String, source: reqwest::Error },

    #[error("reading body of {url} failed: {source}")]
    Body { url: String, source: reqwest::Error },
}

/// Builds the HTTP client shared by all fetch workers
///
/// # Arguments
///
/// * `timeout_secs` - Per-request timeout; `0` leaves requests unbounded
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(timeout_secs: u64) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder().gzip(true).brotli(true);

    if timeout_secs > 0 {
        builder = builder.timeout(Duration::from_secs(timeout_secs));
    }

    builder.build()
}

/// Fetches a single page
///
/// Any HTTP response counts as content: error pages are stored and parsed like
/// any other page. Only transport failures and body read failures are errors.
pub async fn fetch_page(client: &Client, request: &CrawlRequest) -> Result<PageContent, FetchError> {
    tracing::debug!("Sending GET request to {}", request.url);

    let response = client
        .get(&request.url)
        .send()
        .await
        .map_err(|source| FetchError::Transport {
            url: request.url.clone(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        tracing::info!("{} answered with HTTP {}", request.url, status.as_u16());
    }

    let body = response
        .bytes()
        .await
        .map_err(|source| FetchError::Body {
            url: request.url.clone(),
            source,
        })?;

    Ok(PageContent {
        url: request.url.clone(),
        body: body.to_vec(),
    })
}

/// Runs one fetch worker until the request channel or the parse stage closes
///
/// Workers in the same pool share `requests`; whichever worker holds the lock
/// receives the next request. Content is written on the blocking thread pool,
/// then the worker waits until the parse stage accepts the page.
///
/// # Returns
///
/// * `Ok(())` - A neighbouring stage shut down
/// * `Err(CrawlError)` - The content sink failed, which ends the crawl
pub async fn run_fetch_worker(
    id: usize,
    client: Client,
    requests: Arc<Mutex<mpsc::Receiver<CrawlRequest>>>,
    sink: Arc<dyn ContentSink>,
    pages: mpsc::Sender<PageContent>,
) -> Result<(), CrawlError> {
    tracing::debug!("Fetch worker {} started", id);

    loop {
        let request = {
            let mut requests = requests.lock().await;
            requests.recv().await
        };

        let Some(request) = request else {
            tracing::debug!("Fetch worker {}: request channel closed", id);
            return Ok(());
        };

        let page = match fetch_page(&client, &request).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("Dropping {}: {}", request.url, e);
                continue;
            }
        };

        let store_sink = Arc::clone(&sink);
        let page = tokio::task::spawn_blocking(move || {
            store_sink.store(&page.url, &page.body).map(|()| page)
        })
        .await??;

        if pages.send(page).await.is_err() {
            tracing::debug!("Fetch worker {}: parse stage closed", id);
            return Ok(());
        }
    }
}
