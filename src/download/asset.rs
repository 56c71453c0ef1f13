//! Asset file downloading.

use std::path::{Path, PathBuf};

use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::api::DeviantArtApi;
use crate::error::{Error, Result};
use crate::fs::{asset_extension, asset_path};
use crate::output::create_download_bar;

/// Minimum file size to show progress bar (20 MB).
const PROGRESS_THRESHOLD: u64 = 20 * 1024 * 1024;

/// Download an item's asset into `creator_dir` as `<item_id>.<ext>`.
///
/// The URL is fetched without the bearer token. A partially written file is
/// removed when the transfer fails.
pub async fn download_asset(
    api: &DeviantArtApi,
    src: &str,
    creator_dir: &Path,
    item_id: &str,
    show_progress: bool,
) -> Result<PathBuf> {
    let response = api.download_file(src).await?;

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let output_path = asset_path(
        creator_dir,
        item_id,
        &asset_extension(content_type.as_deref(), src),
    )?;

    let content_length = response.content_length();
    let progress = if show_progress
        && content_length
            .map(|l| l > PROGRESS_THRESHOLD)
            .unwrap_or(false)
    {
        Some(create_download_bar(content_length.unwrap_or(0)))
    } else {
        None
    };

    let result = stream_to_file(response, &output_path, progress.as_ref()).await;

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    if let Err(e) = result {
        let _ = tokio::fs::remove_file(&output_path).await;
        return Err(Error::AssetFetch(format!("{}: {}", src, e)));
    }

    Ok(output_path)
}

async fn stream_to_file(
    response: reqwest::Response,
    output_path: &Path,
    progress: Option<&indicatif::ProgressBar>,
) -> Result<()> {
    let mut file = File::create(output_path).await?;
    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| Error::AssetFetch(format!("Stream error: {}", e)))?;
        file.write_all(&chunk).await?;
        downloaded += chunk.len() as u64;

        if let Some(pb) = progress {
            pb.set_position(downloaded);
        }
    }

    file.flush().await?;
    file.sync_all().await?;
    Ok(())
}
