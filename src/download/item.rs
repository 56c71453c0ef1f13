//! Per-item classification and fetch.

use std::path::PathBuf;

use crate::api::Deviation;
use crate::download::asset::download_asset;
use crate::download::run::RunContext;
use crate::error::Result;
use crate::fs::{append_labels, creator_folder, sidecar_path, write_sidecar};

/// What processing an item did.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    /// Ledger already had it flagged restricted.
    KnownRestricted,
    /// Ledger already had it as downloaded.
    AlreadyDownloaded,
    /// Newly flagged restricted and not fetched.
    FlaggedRestricted,
    /// Metadata saved and the ledger updated.
    Saved(SavedItem),
}

/// Details of a saved item.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedItem {
    pub tags: usize,
    pub asset: Option<PathBuf>,
    pub labels: usize,
    /// Fetched although flagged restricted.
    pub restricted: bool,
}

/// Process one gallery item for `creator`.
///
/// Ledger lookups come first, then classification. Everything after
/// classification is best effort except the final ledger write, which always
/// runs once the item was not skipped.
pub async fn process_item(ctx: &RunContext, creator: &str, item: &Deviation) -> Result<ItemOutcome> {
    let id = item.id.as_str();
    let title = item.display_title();
    let url = item.page_url();

    if ctx.ledger.is_restricted(id).await? {
        tracing::debug!("Known restricted content skipped: {} ({})", title, id);
        return Ok(ItemOutcome::KnownRestricted);
    }

    if ctx.ledger.is_known(id).await? {
        tracing::debug!("Skipping already downloaded {}", id);
        return Ok(ItemOutcome::AlreadyDownloaded);
    }

    let restricted = item.is_restricted();
    if restricted {
        tracing::info!("Detected restricted content: {} ({})", title, id);
        ctx.ledger.record_restricted(id, creator, title, url).await?;

        if !ctx.settings.download_restricted {
            return Ok(ItemOutcome::FlaggedRestricted);
        }

        tracing::warn!(
            "Restricted downloads enabled, attempting {} ({}) anyway",
            title,
            id
        );
    }

    let tags = match ctx.api.get_tags(id).await {
        Ok(tags) => tags,
        Err(e) if e.is_fatal() => return Err(e),
        Err(e) => {
            tracing::error!("Failed to get metadata for {}: {}", id, e);
            Vec::new()
        }
    };

    let creator_dir = creator_folder(&ctx.settings.save_dir, creator)?;
    let sidecar = sidecar_path(&creator_dir, id)?;

    let dir_ready = match tokio::fs::create_dir_all(&creator_dir).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Failed to create {}: {}", creator_dir.display(), e);
            false
        }
    };

    let sidecar_written = dir_ready
        && match write_sidecar(&sidecar, title, creator, url, &tags).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to write sidecar {}: {}", sidecar.display(), e);
                false
            }
        };

    let asset = match item.content_src() {
        Some(src) if dir_ready => {
            match download_asset(&ctx.api, src, &creator_dir, id, ctx.settings.show_progress).await
            {
                Ok(path) => Some(path),
                Err(e) => {
                    tracing::warn!("Failed to download asset for {} ({}): {}", title, id, e);
                    None
                }
            }
        }
        Some(_) => None,
        None => {
            tracing::warn!("No asset reference for {} ({})", title, id);
            None
        }
    };

    let mut labels = 0;
    if let (Some(enricher), Some(asset_path)) = (ctx.enricher.as_deref(), asset.as_ref()) {
        match enricher.labels(asset_path).await {
            Ok(found) => {
                if sidecar_written {
                    match append_labels(&sidecar, &found).await {
                        Ok(()) => labels = found.len(),
                        Err(e) => tracing::warn!(
                            "Failed to append labels to {}: {}",
                            sidecar.display(),
                            e
                        ),
                    }
                }
            }
            Err(e) => tracing::warn!("Tagger failed for {}: {}", asset_path.display(), e),
        }
    }

    ctx.ledger
        .record_downloaded(id, creator, title, url, &tags)
        .await?;
    tracing::info!(
        "Saved {} ({}) for {} ({} tags)",
        id,
        title,
        creator,
        tags.len()
    );

    Ok(ItemOutcome::Saved(SavedItem {
        tags: tags.len(),
        asset,
        labels,
        restricted,
    }))
}
