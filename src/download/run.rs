//! Run orchestration: authenticate, list creators, resume, walk galleries.

use std::path::PathBuf;
use std::time::Duration;

use tokio::time::sleep;

use crate::api::{DeviantArtApi, Deviation, FriendEntry};
use crate::config::Config;
use crate::download::checkpoint::{Checkpoint, CheckpointStore};
use crate::download::item::process_item;
use crate::download::pagination::PageWalker;
use crate::download::state::{CreatorStats, RunStats};
use crate::enrich::{AutoTagger, Enricher};
use crate::error::Result;
use crate::ledger::Ledger;

/// Options the controller and item processor read during a run.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub username: String,
    pub save_dir: PathBuf,
    pub page_size: u32,
    /// Pause between pages and between items.
    pub pause: Duration,
    pub force_recheck: bool,
    pub download_restricted: bool,
    pub recheck_restricted: bool,
    pub recheck_items: Vec<String>,
    pub show_progress: bool,
}

impl RunSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            username: config.account.username.trim_start_matches('@').to_string(),
            save_dir: config.options.save_dir.clone(),
            page_size: config.pacing.page_size,
            pause: config.pacing.sleep_time(),
            force_recheck: config.options.force_recheck,
            download_restricted: config.options.download_restricted,
            recheck_restricted: config.options.recheck_restricted,
            recheck_items: config.options.recheck_items.clone(),
            show_progress: true,
        }
    }
}

/// Everything a run needs, owned in one place and passed by reference.
pub struct RunContext {
    pub api: DeviantArtApi,
    pub ledger: Ledger,
    pub checkpoints: CheckpointStore,
    pub enricher: Option<Box<dyn Enricher>>,
    pub settings: RunSettings,
}

impl RunContext {
    pub fn new(
        api: DeviantArtApi,
        ledger: Ledger,
        checkpoints: CheckpointStore,
        enricher: Option<Box<dyn Enricher>>,
        settings: RunSettings,
    ) -> Self {
        Self {
            api,
            ledger,
            checkpoints,
            enricher,
            settings,
        }
    }

    /// Open the state stores and build clients from the configuration.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let api = DeviantArtApi::from_config(config)?;
        let ledger = Ledger::open(&config.database_path()).await?;
        let checkpoints = CheckpointStore::new(config.progress_file());

        let enricher: Option<Box<dyn Enricher>> = match &config.options.tagger_url {
            Some(url) => Some(Box::new(AutoTagger::new(url.clone())?)),
            None => None,
        };

        Ok(Self::new(
            api,
            ledger,
            checkpoints,
            enricher,
            RunSettings::from_config(config),
        ))
    }
}

/// Run the full mirror pass.
///
/// Authentication and creator enumeration failures end the run; a failing
/// creator is logged and skipped.
pub async fn run(ctx: &RunContext) -> Result<RunStats> {
    ctx.api.authenticate().await?;

    let creators = list_followed_creators(ctx).await?;
    tracing::info!("Found {} creators", creators.len());

    if ctx.settings.recheck_restricted {
        let cleared = ctx.ledger.clear_all_restricted().await?;
        tracing::info!("Cleared {} restricted items for re-check", cleared);
    }

    for id in &ctx.settings.recheck_items {
        if ctx.ledger.clear_restricted(id).await? {
            tracing::info!("Cleared restricted flag of {} for re-check", id);
        } else {
            tracing::warn!("{} is not flagged restricted, nothing to re-check", id);
        }
    }

    let start = resume_point(ctx, creators.len()).await;
    walk_creators(ctx, &creators, start).await
}

/// Fetch the full, ordered list of followed creators.
pub async fn list_followed_creators(ctx: &RunContext) -> Result<Vec<String>> {
    tracing::info!(
        "Fetching followed creators for {}...",
        ctx.settings.username
    );

    let walker: PageWalker<FriendEntry> = PageWalker::new(
        &ctx.api,
        ctx.api.friends_url(&ctx.settings.username),
        0,
        ctx.settings.page_size,
        ctx.settings.pause,
    );

    Ok(walker
        .collect_all()
        .await?
        .into_iter()
        .map(|entry| entry.user.username)
        .collect())
}

/// Where this run starts, from the stored checkpoint.
pub async fn resume_point(ctx: &RunContext, creator_count: usize) -> Checkpoint {
    if ctx.settings.force_recheck {
        tracing::info!("Forced recheck, starting from the first creator");
        return Checkpoint::default();
    }

    let checkpoint = match ctx.checkpoints.load().await {
        Ok(Some(checkpoint)) => checkpoint,
        Ok(None) => return Checkpoint::default(),
        Err(e) => {
            tracing::warn!("Failed to load checkpoint: {}", e);
            return Checkpoint::default();
        }
    };

    if checkpoint.creator_index >= creator_count && !checkpoint.is_start() {
        tracing::warn!(
            "Checkpoint points at creator {} but only {} are followed, starting over",
            checkpoint.creator_index,
            creator_count
        );
        return Checkpoint::default();
    }

    if !checkpoint.is_start() {
        tracing::info!(
            "Resuming at creator {} offset {}",
            checkpoint.creator_index + 1,
            checkpoint.page_offset
        );
    }

    checkpoint
}

/// Walk every creator from `start`, then reset the checkpoint.
pub async fn walk_creators(
    ctx: &RunContext,
    creators: &[String],
    start: Checkpoint,
) -> Result<RunStats> {
    let mut stats = RunStats::default();

    for (index, creator) in creators.iter().enumerate().skip(start.creator_index) {
        tracing::info!(
            "Processing creator ({}/{}): {}",
            index + 1,
            creators.len(),
            creator
        );

        let offset = if index == start.creator_index {
            start.page_offset
        } else {
            0
        };

        let mut creator_stats = CreatorStats::new(creator.as_str());
        if let Err(e) = walk_creator(ctx, index, creator, offset, &mut creator_stats).await {
            if e.is_fatal() {
                return Err(e);
            }
            tracing::error!("Error with {}: {}", creator, e);
            creator_stats.failed = true;
        }
        stats.add_creator_stats(creator_stats);
    }

    save_checkpoint(ctx, Checkpoint::default()).await;
    Ok(stats)
}

/// Walk one creator's gallery from `offset`, checkpointing after every page.
async fn walk_creator(
    ctx: &RunContext,
    index: usize,
    creator: &str,
    offset: u64,
    stats: &mut CreatorStats,
) -> Result<()> {
    let mut walker: PageWalker<Deviation> = PageWalker::new(
        &ctx.api,
        ctx.api.gallery_url(),
        offset,
        ctx.settings.page_size,
        ctx.settings.pause,
    )
    .with_param("username", creator);

    while let Some(page) = walker.next_page().await? {
        stats.pages += 1;
        tracing::debug!(
            "{}: {} items at offset {}",
            creator,
            page.results.len(),
            page.offset
        );

        for item in &page.results {
            match process_item(ctx, creator, item).await {
                Ok(outcome) => stats.record(&outcome),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::error!("Failed to process {} for {}: {}", item.id, creator, e);
                    stats.record_failure();
                }
            }
            sleep(ctx.settings.pause).await;
        }

        save_checkpoint(ctx, Checkpoint::new(index, page.next_offset.unwrap_or(0))).await;
    }

    Ok(())
}

async fn save_checkpoint(ctx: &RunContext, checkpoint: Checkpoint) {
    if let Err(e) = ctx.checkpoints.save(checkpoint).await {
        tracing::warn!("{}; the next run may reprocess this page", e);
    }
}
