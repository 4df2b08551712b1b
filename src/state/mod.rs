//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `FrontierState`: the waiting queue and seen set owned by the frontier controller

mod frontier;

pub use frontier::FrontierState;
