//! Unified error types for hollowbeak.
//!
//! Only the variants here abort a run: per-fetcher failures live in the
//! client crate and are recoverable by falling through the fetch chain.

use std::path::PathBuf;

/// Fatal errors surfaced to the CLI.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The source text could not be read.
    #[error("input unavailable: {0}")]
    InputUnavailable(String),

    /// The fetcher list is empty or names an unrecognized variant.
    #[error("no fetchers configured: {0}")]
    NoFetchersConfigured(String),

    /// A fetcher was recognized but could not be constructed.
    #[error("failed to initialize fetcher '{name}': {reason}")]
    FetcherInit { name: String, reason: String },

    /// The requested output format is not one of markdown/html/space.
    #[error("invalid output format: {0}")]
    InvalidOutputFormat(String),

    /// The cache file exists but does not parse. Construction fails
    /// rather than silently discarding the data.
    #[error("cache file {path} is corrupt: {reason}")]
    CacheCorrupt { path: PathBuf, reason: String },

    /// Reading or writing the cache file (or its directory) failed.
    #[error("cache I/O error at {path}: {reason}")]
    CacheIo { path: PathBuf, reason: String },
}
