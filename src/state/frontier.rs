//! Frontier state: the FIFO waiting queue and the seen set
//!
//! The controller is the only owner of a `FrontierState`. Every URL in the waiting
//! queue is also in the seen set, and the seen set only ever grows, so a URL is
//! queued at most once per run.

use std::collections::{HashSet, VecDeque};

/// Queue of URLs waiting to be fetched plus every URL ever queued
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontierState {
    waiting: VecDeque<String>,
    seen: HashSet<String>,
}

impl FrontierState {
    /// Creates an empty frontier
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the initial frontier of a fresh crawl: the seed is both queued and seen
    pub fn seeded(seed: impl Into<String>) -> Self {
        let mut state = Self::new();
        state.enqueue(seed.into());
        state
    }

    /// Rebuilds a frontier from its parts
    ///
    /// Returns `None` if a waiting URL is missing from the seen set.
    pub fn from_parts(waiting: VecDeque<String>, seen: HashSet<String>) -> Option<Self> {
        if waiting.iter().all(|url| seen.contains(url)) {
            Some(Self { waiting, seen })
        } else {
            None
        }
    }

    /// Queues a URL unless it has been seen before
    ///
    /// Returns true if the URL was newly queued.
    pub fn enqueue(&mut self, url: String) -> bool {
        if self.seen.contains(&url) {
            return false;
        }
        self.seen.insert(url.clone());
        self.waiting.push_back(url);
        true
    }

    /// Merges a page's neighbor list, preserving first-occurrence order
    ///
    /// Returns the number of URLs that were newly queued.
    pub fn merge<I, S>(&mut self, neighbors: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut added = 0;
        for url in neighbors {
            let url = url.as_ref();
            if !self.seen.contains(url) && self.enqueue(url.to_string()) {
                added += 1;
            }
        }
        added
    }

    /// Puts dispatched URLs back at the head of the waiting queue, in order
    ///
    /// Only URLs already in the seen set are requeued; anything else is ignored.
    /// Returns the number of URLs requeued.
    pub fn requeue_front<I>(&mut self, urls: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let urls: Vec<String> = urls
            .into_iter()
            .filter(|url| self.seen.contains(url))
            .collect();
        let requeued = urls.len();
        for url in urls.into_iter().rev() {
            self.waiting.push_front(url);
        }
        requeued
    }

    /// Removes and returns the head of the waiting queue
    pub fn pop_next(&mut self) -> Option<String> {
        self.waiting.pop_front()
    }

    /// The URL that would be dispatched next
    pub fn peek_next(&self) -> Option<&str> {
        self.waiting.front().map(String::as_str)
    }

    /// Returns true if nothing is waiting to be dispatched
    pub fn is_empty(&self) -> bool {
        self.waiting.is_empty()
    }

    /// Number of URLs waiting to be dispatched
    pub fn waiting_len(&self) -> usize {
        self.waiting.len()
    }

    /// Number of URLs ever queued
    pub fn seen_len(&self) -> usize {
        self.seen.len()
    }

    /// Returns true if the URL has ever been queued
    pub fn has_seen(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    /// Waiting URLs in dispatch order
    pub fn waiting(&self) -> impl Iterator<Item = &str> {
        self.waiting.iter().map(String::as_str)
    }

    /// All URLs ever queued, in no particular order
    pub fn seen(&self) -> impl Iterator<Item = &str> {
        self.seen.iter().map(String::as_str)
    }
}
