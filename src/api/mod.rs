//! DeviantArt API module.
//!
//! This module provides:
//! - OAuth client-credentials exchange
//! - HTTP client with retry, backoff and token refresh
//! - API response types

pub mod auth;
pub mod client;
pub mod retry;
pub mod types;

pub use auth::CredentialProvider;
pub use client::DeviantArtApi;
pub use retry::{Attempt, RetryPolicy};
pub use types::*;
