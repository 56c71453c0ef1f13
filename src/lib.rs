//! DeviantArt Downloader - incremental mirror of followed creators' galleries.
//!
//! This library provides the fetch-and-checkpoint engine behind the CLI.
//!
//! # Features
//!
//! - OAuth client-credentials authentication with automatic token refresh
//! - Rate-limit aware requests with linear backoff
//! - Server-driven offset pagination over followed creators and galleries
//! - SQLite ledger deduplicating items and flagging restricted content
//! - Page-level checkpoints so interrupted runs resume where they stopped
//! - Optional auto-tagger enrichment of saved images
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use deviantart_downloader::{download, Config, RunContext};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load(Path::new("config.toml"))?;
//!     let ctx = RunContext::from_config(&config).await?;
//!     let stats = download::run(&ctx).await?;
//!     println!("saved {} new items", stats.saved);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod download;
pub mod enrich;
pub mod error;
pub mod fs;
pub mod ledger;
pub mod output;

// Re-exports for convenience
pub use api::DeviantArtApi;
pub use config::Config;
pub use download::{Checkpoint, CheckpointStore, ItemOutcome, RunContext, RunSettings, RunStats};
pub use enrich::{AutoTagger, Enricher};
pub use error::{Error, Result};
pub use ledger::{Ledger, LedgerCounts, LedgerEntry};
