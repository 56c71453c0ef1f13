//! Statistics reporting.

use console::style;

use crate::download::{CreatorStats, RunStats};
use crate::ledger::LedgerCounts;

/// Print statistics for a single creator.
pub fn print_creator_stats(stats: &CreatorStats) {
    println!();
    let heading = format!("Statistics for {}:", stats.creator_name);
    if stats.failed {
        println!("{} {}", style(heading).bold(), style("(failed)").red());
    } else {
        println!("{}", style(heading).bold());
    }
    println!("  Pages:      {}", stats.pages);
    println!("  Saved:      {}", stats.saved);
    println!("  Assets:     {}", stats.assets);
    if stats.missing_assets > 0 {
        println!("  No asset:   {}", style(stats.missing_assets).yellow());
    }
    println!("  Restricted: {} (flagged)", stats.flagged_restricted);
    println!("  Skipped:    {} (already known)", stats.skipped());
    if stats.failed_items > 0 {
        println!("  Failed:     {}", style(stats.failed_items).red());
    }
}

/// Print global statistics across all creators.
pub fn print_global_stats(stats: &RunStats, ledger: Option<LedgerCounts>) {
    println!();
    println!("{}", style("═".repeat(50)).dim());
    println!("{}", style("Global Statistics:").bold());
    println!("  Creators processed: {}", stats.creators_processed);
    if stats.creators_failed > 0 {
        println!("  Creators failed:    {}", style(stats.creators_failed).red());
    }
    println!("  Saved:      {}", style(stats.saved).green());
    println!("  Assets:     {}", stats.assets);
    println!("  Restricted: {} (flagged)", stats.flagged_restricted);
    println!("  Skipped:    {} (already known)", stats.skipped);
    if stats.failed_items > 0 {
        println!("  Failed:     {}", style(stats.failed_items).red());
    }
    if let Some(counts) = ledger {
        println!(
            "  Ledger:     {} downloaded, {} restricted",
            counts.downloaded, counts.restricted
        );
    }
    println!("{}", style("═".repeat(50)).dim());
}
