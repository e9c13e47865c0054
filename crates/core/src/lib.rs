//! Core types and shared functionality for hollowbeak.
//!
//! This crate provides:
//! - Persistent TTL title cache backed by a JSON file
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheEntry, TitleCache};
pub use config::AppConfig;
pub use error::Error;
