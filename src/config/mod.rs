//! Configuration module for the deviantart-downloader.
//!
//! This module handles:
//! - Loading configuration from TOML files
//! - CLI argument and environment merging
//! - Configuration validation

pub mod loader;
pub mod validation;

pub use loader::{AccountConfig, ApiConfig, Config, OptionsConfig, PacingConfig};
pub use validation::validate_config;
