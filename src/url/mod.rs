//! URL handling module
//!
//! Turns the raw `href` values found on a page into canonical absolute URLs that
//! the frontier can deduplicate on.

mod resolve;

pub use resolve::resolve;
