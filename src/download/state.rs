//! Run statistics.

use crate::download::item::ItemOutcome;

/// Per-creator counters.
#[derive(Debug, Default, Clone)]
pub struct CreatorStats {
    pub creator_name: String,
    pub pages: u64,
    pub saved: u64,
    pub assets: u64,
    pub missing_assets: u64,
    pub flagged_restricted: u64,
    pub skipped_known: u64,
    pub skipped_restricted: u64,
    pub failed_items: u64,
    pub failed: bool,
}

impl CreatorStats {
    pub fn new(creator_name: impl Into<String>) -> Self {
        Self {
            creator_name: creator_name.into(),
            ..Default::default()
        }
    }

    /// Count the result of processing one item.
    pub fn record(&mut self, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::KnownRestricted => self.skipped_restricted += 1,
            ItemOutcome::AlreadyDownloaded => self.skipped_known += 1,
            ItemOutcome::FlaggedRestricted => self.flagged_restricted += 1,
            ItemOutcome::Saved(saved) => {
                self.saved += 1;
                if saved.restricted {
                    self.flagged_restricted += 1;
                }
                if saved.asset.is_some() {
                    self.assets += 1;
                } else {
                    self.missing_assets += 1;
                }
            }
        }
    }

    pub fn record_failure(&mut self) {
        self.failed_items += 1;
    }

    /// Items skipped because the ledger already knew them.
    pub fn skipped(&self) -> u64 {
        self.skipped_known + self.skipped_restricted
    }
}

/// Statistics across all creators of a run.
#[derive(Debug, Default)]
pub struct RunStats {
    pub creators: Vec<CreatorStats>,
    pub saved: u64,
    pub assets: u64,
    pub flagged_restricted: u64,
    pub skipped: u64,
    pub failed_items: u64,
    pub creators_processed: u64,
    pub creators_failed: u64,
}

impl RunStats {
    /// Add statistics from a creator's walk.
    pub fn add_creator_stats(&mut self, stats: CreatorStats) {
        self.saved += stats.saved;
        self.assets += stats.assets;
        self.flagged_restricted += stats.flagged_restricted;
        self.skipped += stats.skipped();
        self.failed_items += stats.failed_items;
        self.creators_processed += 1;
        if stats.failed {
            self.creators_failed += 1;
        }
        self.creators.push(stats);
    }
}
