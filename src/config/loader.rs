//! Configuration structures and loading logic.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Upper bound for any configured pause, in seconds.
pub const MAX_PAUSE_SECS: u64 = 3600;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub account: AccountConfig,

    #[serde(default)]
    pub options: OptionsConfig,

    #[serde(default)]
    pub pacing: PacingConfig,

    #[serde(default)]
    pub api: ApiConfig,
}

/// OAuth client credentials and the account whose follows are mirrored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountConfig {
    /// DeviantArt application client ID.
    #[serde(default)]
    pub client_id: String,

    /// DeviantArt application client secret.
    #[serde(default)]
    pub client_secret: String,

    /// User whose followed creators are walked.
    #[serde(default)]
    pub username: String,
}

/// Download options configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionsConfig {
    /// Base directory for downloads.
    #[serde(default = "default_save_dir")]
    pub save_dir: PathBuf,

    /// SQLite ledger location. Defaults to `<save_dir>/deviantart.db`.
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Resume checkpoint location. Defaults to `<save_dir>/progress.json`.
    #[serde(default)]
    pub progress_file: Option<PathBuf>,

    /// Log file location. Defaults to `<save_dir>/downloader.log`.
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Ignore the stored checkpoint and start from the first creator.
    #[serde(default)]
    pub force_recheck: bool,

    /// Fetch restricted (premium) items anyway after flagging them.
    #[serde(default)]
    pub download_restricted: bool,

    /// Drop restricted flags before the walk so those items are classified again.
    #[serde(default)]
    pub recheck_restricted: bool,

    /// Items whose restricted flag is dropped before the walk.
    #[serde(default)]
    pub recheck_items: Vec<String>,

    /// Auto-tagger endpoint used for enrichment. Disabled when unset.
    #[serde(default)]
    pub tagger_url: Option<String>,
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            save_dir: default_save_dir(),
            database_path: None,
            progress_file: None,
            log_file: None,
            force_recheck: false,
            download_restricted: false,
            recheck_restricted: false,
            recheck_items: Vec::new(),
            tagger_url: None,
        }
    }
}

/// Sleep, retry and backoff tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Pause between pages, between items and after failed requests.
    #[serde(default = "default_sleep_time")]
    pub sleep_time_secs: f64,

    /// Attempts per API request.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base for the linear rate-limit backoff.
    #[serde(default = "default_rate_limit_sleep")]
    pub rate_limit_sleep_secs: u64,

    /// Timeout for a single API request.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Overall limit for one asset transfer.
    #[serde(default = "default_asset_timeout")]
    pub asset_timeout_secs: u64,

    /// Entries requested per page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            sleep_time_secs: default_sleep_time(),
            max_retries: default_max_retries(),
            rate_limit_sleep_secs: default_rate_limit_sleep(),
            request_timeout_secs: default_request_timeout(),
            asset_timeout_secs: default_asset_timeout(),
            page_size: default_page_size(),
        }
    }
}

impl PacingConfig {
    /// Pause as a duration; negative or non-finite values mean no pause.
    pub fn sleep_time(&self) -> Duration {
        let max = Duration::from_secs(MAX_PAUSE_SECS);
        if !self.sleep_time_secs.is_finite() || self.sleep_time_secs <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(self.sleep_time_secs)
            .unwrap_or(max)
            .min(max)
    }

    pub fn rate_limit_sleep(&self) -> Duration {
        Duration::from_secs(self.rate_limit_sleep_secs.min(MAX_PAUSE_SECS))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn asset_timeout(&self) -> Duration {
        Duration::from_secs(self.asset_timeout_secs)
    }
}

/// Remote endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL for both the OAuth exchange and the REST API.
    #[serde(default = "default_api_base")]
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base(),
        }
    }
}

fn default_save_dir() -> PathBuf {
    PathBuf::from("./downloads")
}

fn default_sleep_time() -> f64 {
    1.0
}

fn default_max_retries() -> u32 {
    5
}

fn default_rate_limit_sleep() -> u64 {
    30
}

fn default_request_timeout() -> u64 {
    20
}

fn default_asset_timeout() -> u64 {
    600
}

fn default_page_size() -> u32 {
    24
}

fn default_api_base() -> String {
    "https://www.deviantart.com".to_string()
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Config(format!(
                    "Configuration file not found: {}. Create one from config.example.toml",
                    path.display()
                ))
            } else {
                Error::Io(e)
            }
        })?;

        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Effective ledger path.
    pub fn database_path(&self) -> PathBuf {
        self.options
            .database_path
            .clone()
            .unwrap_or_else(|| self.options.save_dir.join("deviantart.db"))
    }

    /// Effective checkpoint path.
    pub fn progress_file(&self) -> PathBuf {
        self.options
            .progress_file
            .clone()
            .unwrap_or_else(|| self.options.save_dir.join("progress.json"))
    }

    /// Effective log file path.
    pub fn log_file(&self) -> PathBuf {
        self.options
            .log_file
            .clone()
            .unwrap_or_else(|| self.options.save_dir.join("downloader.log"))
    }
}
