//! Client code for hollowbeak.
//!
//! This crate provides URL extraction from free text, the title fetcher
//! capability trait with its three implementations, and the ordered
//! fallback chain that ties them together.

pub mod extract;
pub mod fetch;

pub use extract::{UrlGrammar, UrlRecord, extract_title, extract_urls};

pub use fetch::chain::DEFAULT_FETCHER_ORDER;
pub use fetch::{FetchChain, FetchConfig, FetchError, HttpTitleFetcher, TitleFetcher, TitleMap};

pub use fetch::history::HistoryTitleFetcher;

#[cfg(feature = "scripted")]
pub use fetch::scripted::ScriptedTitleFetcher;
