//! Error types for the deviantart-downloader application.

use thiserror::Error;

/// Main error type for the application.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration value for '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    #[error("Missing required configuration: {0}")]
    MissingConfig(String),

    // API errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Failed after {attempts} attempts: {url}")]
    RetryExhausted { url: String, attempts: u32 },

    #[error("Unexpected response shape from {url}: {message}")]
    Protocol { url: String, message: String },

    // Per-item degradations
    #[error("Metadata unavailable for {0}")]
    Metadata(String),

    #[error("Asset download failed: {0}")]
    AssetFetch(String),

    #[error("Enrichment failed: {0}")]
    Enrichment(String),

    // State store errors
    #[error("Failed to persist {what}: {message}")]
    Persistence { what: String, message: String },

    #[error("Ledger error: {0}")]
    Database(#[from] sqlx::Error),

    // File system errors
    #[error("Invalid filename (path traversal attempt): {0}")]
    InvalidFilename(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // HTTP errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    // URL parsing errors
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether this error must stop the whole run rather than a single creator or item.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Authentication(_)
                | Error::Config(_)
                | Error::ConfigValidation { .. }
                | Error::MissingConfig(_)
        )
    }
}

/// Process exit codes.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const API_ERROR: i32 = 2;
    pub const CONFIG_ERROR: i32 = 3;
    pub const STATE_ERROR: i32 = 4;
    pub const UNEXPECTED_ERROR: i32 = 5;
}
