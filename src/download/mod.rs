//! Download module.
//!
//! This module provides:
//! - Checkpoint persistence for resume
//! - Offset pagination over listing endpoints
//! - Per-item classification and fetch
//! - Asset downloading
//! - Run orchestration and statistics

pub mod asset;
pub mod checkpoint;
pub mod item;
pub mod pagination;
pub mod run;
pub mod state;

pub use checkpoint::{Checkpoint, CheckpointStore};
pub use item::{process_item, ItemOutcome, SavedItem};
pub use pagination::{Page, PageWalker};
pub use run::{list_followed_creators, resume_point, run, walk_creators, RunContext, RunSettings};
pub use state::{CreatorStats, RunStats};
