//! Crawler module: the fetch → parse → frontier pipeline
//!
//! This module contains the crawl pipeline, including:
//! - HTTP fetch workers that store raw content
//! - Parse workers that extract text and links
//! - The frontier controller that deduplicates, dispatches, and checkpoints
//! - Termination signal handling
//!
//! The stages run as separate tokio tasks connected by channels. The request
//! channel into the fetch stage is bounded, which throttles dispatch to the rate
//! pages are actually fetched. The content channel between fetch and parse holds
//! a single page, so a fetch worker waits for a parse worker to take its page.

mod controller;
mod fetcher;
mod parser;
mod shutdown;

pub use controller::{Controller, SharedRequests};
pub use fetcher::{build_http_client, fetch_page, run_fetch_worker, FetchError};
pub use parser::{parse_page, run_parse_worker, ParseError};
pub use shutdown::shutdown_signal;

use crate::config::{Config, OutputConfig};
use crate::state::FrontierState;
use crate::storage::{CheckpointStore, ContentSink, CrawlHistory, FsContentStore};
use crate::CrawlError;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;

/// Pages that may wait between the fetch and parse stages
const CONTENT_CHANNEL_CAPACITY: usize = 1;

/// A URL handed from the frontier controller to the fetch stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlRequest {
    pub url: String,
}

/// Raw content of a successfully fetched page
#[derive(Debug, Clone)]
pub struct PageContent {
    pub url: String,
    pub body: Vec<u8>,
}

/// What the parse stage extracted from a page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPage {
    /// URL the page was fetched from
    pub url: String,

    /// Raw text nodes in document order
    pub text: Vec<String>,

    /// Absolute, fragment-free link targets in document order (may repeat)
    pub neighbors: Vec<String>,
}

/// Process-wide handles, opened once at startup and handed to the stages
pub struct CrawlContext {
    /// Sink for raw page bodies, shared by the fetch workers
    pub content: Arc<dyn ContentSink>,

    /// Crawl history log, owned by the frontier controller
    pub history: CrawlHistory,

    /// Checkpoint file used at startup and shutdown
    pub checkpoints: CheckpointStore,
}

impl CrawlContext {
    /// Opens the filesystem-backed context described by the output configuration
    pub fn open(output: &OutputConfig) -> Result<Self, CrawlError> {
        Ok(Self {
            content: Arc::new(FsContentStore::new(&output.content_dir)),
            history: CrawlHistory::open(&output.history_path)?,
            checkpoints: CheckpointStore::new(&output.checkpoint_path),
        })
    }
}

/// Decides where the crawl starts
///
/// A usable checkpoint is resumed unless `fresh` is set; otherwise the frontier
/// holds only the seed.
pub fn initial_frontier(
    seed: &str,
    checkpoints: &CheckpointStore,
    fresh: bool,
) -> Result<FrontierState, CrawlError> {
    if fresh {
        tracing::info!("Starting fresh crawl from seed {}", seed);
        return Ok(FrontierState::seeded(seed));
    }

    match checkpoints.load()? {
        Some(state) => {
            tracing::info!(
                "Resuming from checkpoint: {} waiting, {} seen",
                state.waiting_len(),
                state.seen_len()
            );
            Ok(state)
        }
        None => {
            tracing::info!("Starting anew from seed {}", seed);
            Ok(FrontierState::seeded(seed))
        }
    }
}

/// Runs a crawl until SIGINT or SIGTERM
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Open the content store, history log, and checkpoint store
/// 2. Resume the frontier from the checkpoint, or seed it
/// 3. Spawn the fetch and parse workers
/// 4. Run the frontier controller until a termination signal arrives
/// 5. Save the checkpoint
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `fresh` - Ignore any existing checkpoint and start from the seed
///
/// # Returns
///
/// * `Ok(FrontierState)` - The checkpointed frontier after a graceful shutdown
/// * `Err(CrawlError)` - A fatal error stopped the crawl; no checkpoint was written
pub async fn crawl(config: Config, fresh: bool) -> Result<FrontierState, CrawlError> {
    let context = CrawlContext::open(&config.output)?;
    run_crawl(config, context, fresh, shutdown_signal()).await
}

/// Runs the crawl pipeline until `shutdown` resolves
///
/// A stage that fails ends the crawl immediately with its error; the remaining
/// stage tasks are aborted and the frontier is not checkpointed.
///
/// # Example
///
/// ```no_run
/// use loopcrawl::config::Config;
/// use loopcrawl::crawler::{run_crawl, CrawlContext};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config::default();
/// let context = CrawlContext::open(&config.output)?;
/// let state = run_crawl(config, context, false, tokio::time::sleep(Duration::from_secs(60))).await?;
/// println!("{} URLs still waiting", state.waiting_len());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl<F>(
    config: Config,
    context: CrawlContext,
    fresh: bool,
    shutdown: F,
) -> Result<FrontierState, CrawlError>
where
    F: Future<Output = ()>,
{
    let CrawlContext {
        content,
        history,
        checkpoints,
    } = context;
    let crawler = &config.crawler;

    let frontier = initial_frontier(&crawler.seed_url, &checkpoints, fresh)?;
    let client = build_http_client(crawler.request_timeout_secs)?;

    let (request_tx, request_rx) = mpsc::channel(crawler.request_channel_capacity);
    let (content_tx, content_rx) = mpsc::channel(CONTENT_CHANNEL_CAPACITY);
    let (parsed_tx, parsed_rx) = mpsc::unbounded_channel();
    let request_rx = Arc::new(Mutex::new(request_rx));
    let content_rx = Arc::new(Mutex::new(content_rx));

    let mut stages = JoinSet::new();
    for id in 0..crawler.fetch_workers {
        stages.spawn(run_fetch_worker(
            id,
            client.clone(),
            Arc::clone(&request_rx),
            Arc::clone(&content),
            content_tx.clone(),
        ));
    }
    for id in 0..crawler.parse_workers {
        stages.spawn(run_parse_worker(
            id,
            Arc::clone(&content_rx),
            parsed_tx.clone(),
            crawler.halt_on_malformed_document,
        ));
    }
    let undelivered = Arc::downgrade(&request_rx);
    drop(request_rx);
    drop(content_rx);
    drop(content_tx);
    drop(parsed_tx);

    tracing::info!(
        "Pipeline started: {} fetch workers, {} parse workers, request channel capacity {}",
        crawler.fetch_workers,
        crawler.parse_workers,
        crawler.request_channel_capacity
    );

    let controller = Controller::new(
        frontier,
        request_tx,
        undelivered,
        parsed_rx,
        history,
        checkpoints,
    );
    let run = controller.run(shutdown);
    tokio::pin!(run);

    loop {
        tokio::select! {
            result = &mut run => return result,

            Some(joined) = stages.join_next() => match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::error!("Pipeline stage failed: {}", e);
                    return Err(e);
                }
                Err(e) => return Err(e.into()),
            },
        }
    }
}
