//! Frontier controller - the single owner of the crawl frontier
//!
//! The controller reacts to three event sources:
//! - Parsed pages arriving from the parse stage: new neighbors are queued and the
//!   page is written to the crawl history
//! - Free capacity on the request channel while URLs are waiting: the head of the
//!   queue is dispatched to the fetch stage
//! - The shutdown signal: requests still buffered in the request channel go back
//!   to the head of the queue, the frontier is checkpointed and the controller stops
//!
//! Nothing else reads or writes the frontier, so no locking is involved; all
//! coordination is channel hand-off.

use crate::crawler::{CrawlRequest, ParsedPage};
use crate::state::FrontierState;
use crate::storage::{CheckpointStore, CrawlHistory};
use crate::CrawlError;
use std::future::Future;
use std::sync::Weak;
use tokio::sync::{mpsc, Mutex};

/// Pages merged between two progress log lines
const PROGRESS_INTERVAL: u64 = 10;

/// Receiving half of the request channel, shared by the fetch workers
pub type SharedRequests = Mutex<mpsc::Receiver<CrawlRequest>>;

/// Main frontier controller structure
pub struct Controller {
    frontier: FrontierState,
    requests: mpsc::Sender<CrawlRequest>,
    undelivered: Weak<SharedRequests>,
    parsed: mpsc::UnboundedReceiver<ParsedPage>,
    history: CrawlHistory,
    checkpoints: CheckpointStore,
    pages_merged: u64,
}

impl Controller {
    /// Creates a controller over an initial frontier
    ///
    /// # Arguments
    ///
    /// * `frontier` - Seed-only or restored frontier state
    /// * `requests` - Bounded channel feeding the fetch stage
    /// * `undelivered` - The fetch workers' end of `requests`, drained at shutdown;
    ///   held weakly so the channel closes once every fetch worker is gone
    /// * `parsed` - Channel carrying parsed pages back from the parse stage
    /// * `history` - Crawl history log, appended to for every parsed page
    /// * `checkpoints` - Where the frontier is saved on shutdown
    pub fn new(
        frontier: FrontierState,
        requests: mpsc::Sender<CrawlRequest>,
        undelivered: Weak<SharedRequests>,
        parsed: mpsc::UnboundedReceiver<ParsedPage>,
        history: CrawlHistory,
        checkpoints: CheckpointStore,
    ) -> Self {
        Self {
            frontier,
            requests,
            undelivered,
            parsed,
            history,
            checkpoints,
            pages_merged: 0,
        }
    }

    /// Runs the controller until `shutdown` resolves
    ///
    /// Parsed pages already waiting in the channel are merged before a pending
    /// shutdown is honoured. Dispatch is only attempted while the waiting queue is
    /// non-empty; a URL leaves the queue only once request channel capacity has
    /// been reserved for it, so a full channel blocks dispatch without losing URLs.
    /// Requests no fetch worker has received by shutdown are requeued, so only
    /// the requests workers are already handling are missing from the checkpoint.
    ///
    /// # Returns
    ///
    /// * `Ok(FrontierState)` - The frontier as checkpointed at shutdown
    /// * `Err(CrawlError)` - A stage closed, or the history or checkpoint could not
    ///   be written
    pub async fn run<F>(mut self, shutdown: F) -> Result<FrontierState, CrawlError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        tracing::info!(
            "Frontier controller running: {} waiting, {} seen",
            self.frontier.waiting_len(),
            self.frontier.seen_len()
        );
        if self.frontier.is_empty() {
            tracing::warn!("Frontier is empty; waiting for parsed pages or shutdown");
        }

        let requests = self.requests.clone();

        loop {
            let can_dispatch = !self.frontier.is_empty();

            tokio::select! {
                biased;

                page = self.parsed.recv() => match page {
                    Some(page) => self.on_parsed(page)?,
                    None => return Err(CrawlError::StageClosed("parse")),
                },

                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested, saving checkpoint");
                    self.reclaim_undelivered().await;
                    self.checkpoints.save(&self.frontier)?;
                    self.history.close()?;
                    tracing::info!("Checkpoint saved, frontier controller terminated");
                    return Ok(self.frontier);
                }

                permit = requests.reserve(), if can_dispatch => {
                    let permit = permit.map_err(|_| CrawlError::StageClosed("fetch"))?;
                    if let Some(url) = self.frontier.pop_next() {
                        tracing::debug!("Dispatching {}", url);
                        permit.send(CrawlRequest { url });
                    }
                }
            }
        }
    }

    /// Moves requests still buffered in the request channel back into the queue
    async fn reclaim_undelivered(&mut self) {
        let Some(shared) = self.undelivered.upgrade() else {
            return;
        };

        let mut reclaimed = Vec::new();
        loop {
            let buffered = self.requests.max_capacity() - self.requests.capacity();
            if buffered == 0 {
                break;
            }

            // A worker holding the lock with requests buffered is about to take
            // one and release it
            match shared.try_lock() {
                Ok(mut receiver) => {
                    while let Ok(request) = receiver.try_recv() {
                        reclaimed.push(request.url);
                    }
                    break;
                }
                Err(_) => tokio::task::yield_now().await,
            }
        }

        if !reclaimed.is_empty() {
            let requeued = self.frontier.requeue_front(reclaimed);
            tracing::info!("Requeued {} undelivered requests", requeued);
        }
    }

    /// Merges a parsed page into the frontier and records it in the history
    fn on_parsed(&mut self, page: ParsedPage) -> Result<(), CrawlError> {
        let added = self.frontier.merge(&page.neighbors);
        self.history.append(&page)?;
        self.pages_merged += 1;

        tracing::debug!(
            "Merged {}: {} of {} links new",
            page.url,
            added,
            page.neighbors.len()
        );

        if self.pages_merged % PROGRESS_INTERVAL == 0 {
            tracing::info!(
                "Progress: {} pages parsed, {} waiting, {} seen",
                self.pages_merged,
                self.frontier.waiting_len(),
                self.frontier.seen_len()
            );
        }

        Ok(())
    }
}
