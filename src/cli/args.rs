//! Command-line argument definitions using clap.

use clap::Parser;
use std::path::PathBuf;

use crate::config::Config;

/// DeviantArt gallery mirror CLI.
#[derive(Parser, Debug)]
#[command(
    name = "deviantart-downloader",
    version,
    about = "Mirror the galleries of the creators a DeviantArt account follows",
    long_about = "Walks every followed creator's gallery, saves each new item's image and a \
                  text sidecar with its tags, and remembers what it has seen.\n\n\
                  Runs are resumable: progress is checkpointed after every page."
)]
pub struct Args {
    /// Path to configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Application client ID.
    #[arg(long, env = "CLIENT_ID")]
    pub client_id: Option<String>,

    /// Application client secret.
    #[arg(long, env = "CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Account whose followed creators are mirrored.
    #[arg(short, long, env = "USERNAME")]
    pub username: Option<String>,

    /// Base directory for downloads.
    #[arg(short = 'd', long = "save-dir", env = "SAVE_DIR")]
    pub save_dir: Option<PathBuf>,

    /// Ledger database path.
    #[arg(long = "db-path", env = "DB_PATH")]
    pub database_path: Option<PathBuf>,

    /// Checkpoint file path.
    #[arg(long = "progress-file", env = "PROGRESS_FILE")]
    pub progress_file: Option<PathBuf>,

    /// Log file path.
    #[arg(long = "log-file", env = "LOG_PATH")]
    pub log_file: Option<PathBuf>,

    /// Seconds to pause between pages, items and failed requests.
    #[arg(long, env = "SLEEP_TIME")]
    pub sleep_time: Option<f64>,

    /// Attempts per API request.
    #[arg(long, env = "MAX_RETRIES")]
    pub max_retries: Option<u32>,

    /// Base seconds for the rate-limit backoff.
    #[arg(long, env = "RATE_LIMIT_SLEEP")]
    pub rate_limit_sleep: Option<u64>,

    /// Entries requested per page.
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Ignore the stored checkpoint and start from the first creator.
    #[arg(long, env = "FORCE_RECHECK")]
    pub force_recheck: bool,

    /// Fetch restricted (premium) items anyway after flagging them.
    #[arg(long, env = "DOWNLOAD_SUBSCRIPTIONS")]
    pub download_restricted: bool,

    /// Forget restricted flags so those items are classified again.
    #[arg(long)]
    pub recheck_restricted: bool,

    /// Forget the restricted flag of one item (repeatable).
    #[arg(long = "recheck-item", value_name = "ID")]
    pub recheck_items: Vec<String>,

    /// Auto-tagger endpoint for enrichment.
    #[arg(long, env = "TAGGER_URL")]
    pub tagger_url: Option<String>,

    /// API base URL.
    #[arg(long)]
    pub api_base: Option<String>,

    /// Hide download progress bars.
    #[arg(long, short)]
    pub quiet: bool,

    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,
}

impl Args {
    /// Merge CLI arguments into an existing config, overriding where specified.
    pub fn merge_into_config(&self, config: &mut Config) {
        // Override account settings if provided
        if let Some(client_id) = &self.client_id {
            config.account.client_id = client_id.clone();
        }

        if let Some(client_secret) = &self.client_secret {
            config.account.client_secret = client_secret.clone();
        }

        if let Some(username) = &self.username {
            config.account.username = username.clone();
        }

        // Override options if provided
        if let Some(dir) = &self.save_dir {
            config.options.save_dir = dir.clone();
        }

        if let Some(path) = &self.database_path {
            config.options.database_path = Some(path.clone());
        }

        if let Some(path) = &self.progress_file {
            config.options.progress_file = Some(path.clone());
        }

        if let Some(path) = &self.log_file {
            config.options.log_file = Some(path.clone());
        }

        if let Some(url) = &self.tagger_url {
            config.options.tagger_url = Some(url.clone());
        }

        if let Some(base) = &self.api_base {
            config.api.base_url = base.clone();
        }

        // Pacing
        if let Some(sleep_time) = self.sleep_time {
            config.pacing.sleep_time_secs = sleep_time;
        }

        if let Some(max_retries) = self.max_retries {
            config.pacing.max_retries = max_retries;
        }

        if let Some(rate_limit_sleep) = self.rate_limit_sleep {
            config.pacing.rate_limit_sleep_secs = rate_limit_sleep;
        }

        if let Some(page_size) = self.page_size {
            config.pacing.page_size = page_size;
        }

        // Boolean flags (only override if set to non-default)
        if self.force_recheck {
            config.options.force_recheck = true;
        }

        if self.download_restricted {
            config.options.download_restricted = true;
        }

        if self.recheck_restricted {
            config.options.recheck_restricted = true;
        }

        config
            .options
            .recheck_items
            .extend(self.recheck_items.iter().cloned());
    }
}
