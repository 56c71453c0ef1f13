//! DeviantArt API HTTP client.

use std::time::Duration;

use reqwest::{header, Client, Response};
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tokio::time::sleep;

use crate::api::auth::{truncate, CredentialProvider};
use crate::api::retry::{Attempt, RetryPolicy};
use crate::api::types::MetadataResponse;
use crate::config::Config;
use crate::error::{Error, Result};

/// Followed-creators listing, followed by the username.
const FRIENDS_PATH: &str = "/api/v1/oauth2/user/friends/";

/// Gallery listing across all folders.
const GALLERY_PATH: &str = "/api/v1/oauth2/gallery/all";

/// Tag metadata lookup.
const METADATA_PATH: &str = "/api/v1/oauth2/deviation/metadata";

/// Connection timeout shared by API and asset requests.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default limit for a whole asset transfer.
const ASSET_TIMEOUT: Duration = Duration::from_secs(600);

/// DeviantArt API client with token refresh and retry handling.
///
/// Every authenticated call goes through [`DeviantArtApi::request`]; the
/// client holds the current bearer token and replaces it whenever the
/// server rejects it.
pub struct DeviantArtApi {
    client: Client,
    base_url: String,
    credentials: CredentialProvider,
    token: RwLock<String>,
    policy: RetryPolicy,
    request_timeout: Duration,
    asset_timeout: Duration,
}

impl DeviantArtApi {
    /// Create a new API client. No request is made until [`authenticate`](Self::authenticate).
    pub fn new(
        base_url: &str,
        client_id: String,
        client_secret: String,
        policy: RetryPolicy,
        request_timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = base_url.trim_end_matches('/').to_string();
        let credentials =
            CredentialProvider::new(client.clone(), &base_url, client_id, client_secret);

        Ok(Self {
            client,
            base_url,
            credentials,
            token: RwLock::new(String::new()),
            policy,
            request_timeout,
            asset_timeout: ASSET_TIMEOUT,
        })
    }

    /// Build a client from the loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            &config.api.base_url,
            config.account.client_id.clone(),
            config.account.client_secret.clone(),
            RetryPolicy::from(&config.pacing),
            config.pacing.request_timeout(),
        )?
        .with_asset_timeout(config.pacing.asset_timeout()))
    }

    /// Limit for a whole asset transfer, body included.
    pub fn with_asset_timeout(mut self, timeout: Duration) -> Self {
        self.asset_timeout = timeout;
        self
    }

    /// Acquire the initial token.
    pub async fn authenticate(&self) -> Result<()> {
        let token = self.credentials.acquire().await?;
        *self.token.write().await = token;
        Ok(())
    }

    /// The token currently in use.
    pub async fn token(&self) -> String {
        self.token.read().await.clone()
    }

    async fn refresh_token(&self) -> Result<()> {
        tracing::warn!("Token rejected, refreshing");
        self.authenticate().await
    }

    pub fn friends_url(&self, username: &str) -> String {
        format!("{}{}{}", self.base_url, FRIENDS_PATH, username)
    }

    pub fn gallery_url(&self) -> String {
        format!("{}{}", self.base_url, GALLERY_PATH)
    }

    /// Perform an authenticated GET and parse the body as `T`.
    ///
    /// 429 backs off linearly, 401 exchanges the token and retries at once,
    /// any other failure pauses for the fixed failure sleep. Gives up with
    /// [`Error::RetryExhausted`] after the policy's attempt limit.
    pub async fn request<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(String, String)],
    ) -> Result<T> {
        let max_attempts = self.policy.max_attempts;

        for attempt in 1..=max_attempts {
            let last = attempt == max_attempts;

            match self.attempt(url, params).await {
                Attempt::Success(body) => {
                    return serde_json::from_str(&body).map_err(|e| Error::Protocol {
                        url: url.to_string(),
                        message: e.to_string(),
                    });
                }
                Attempt::RateLimited => {
                    let wait = self.policy.rate_limit_delay(attempt);
                    tracing::warn!(
                        "Rate limited on {} (attempt {}/{}), sleeping {:?}",
                        url,
                        attempt,
                        max_attempts,
                        wait
                    );
                    if !last {
                        sleep(wait).await;
                    }
                }
                Attempt::Unauthorized => {
                    self.refresh_token().await?;
                }
                Attempt::Failed(reason) => {
                    tracing::error!(
                        "Request to {} failed (attempt {}/{}): {}",
                        url,
                        attempt,
                        max_attempts,
                        reason
                    );
                    if !last {
                        sleep(self.policy.failure_sleep).await;
                    }
                }
            }
        }

        Err(Error::RetryExhausted {
            url: url.to_string(),
            attempts: max_attempts,
        })
    }

    /// One GET with the current token, classified.
    async fn attempt(&self, url: &str, params: &[(String, String)]) -> Attempt {
        let token = self.token().await;

        tracing::debug!("GET {} {:?}", url, params);

        let response = match self
            .client
            .get(url)
            .query(params)
            .bearer_auth(&token)
            .timeout(self.request_timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return Attempt::Failed(format!("request error: {}", e)),
        };

        let status = response.status();
        tracing::debug!("Response status: {}", status);

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return Attempt::Failed(format!("failed to read body: {}", e)),
        };

        if status.is_success() {
            Attempt::Success(body)
        } else {
            Attempt::from_status(status, truncate(&body, 200))
        }
    }

    /// Fetch the tag names of a deviation.
    pub async fn get_tags(&self, deviation_id: &str) -> Result<Vec<String>> {
        let url = format!("{}{}", self.base_url, METADATA_PATH);
        let params = vec![
            ("deviationids[]".to_string(), deviation_id.to_string()),
            ("mature_content".to_string(), "true".to_string()),
        ];

        let metadata: MetadataResponse = self.request(&url, &params).await.map_err(|e| {
            if e.is_fatal() {
                e
            } else {
                Error::Metadata(format!("{}: {}", deviation_id, e))
            }
        })?;

        Ok(metadata.tags_for(deviation_id))
    }

    /// Download a file from a pre-signed or public URL, without the bearer token.
    pub async fn download_file(&self, url: &str) -> Result<Response> {
        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "*/*")
            .timeout(self.asset_timeout)
            .send()
            .await
            .map_err(|e| Error::AssetFetch(format!("{}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(Error::AssetFetch(format!(
                "{}: HTTP {}",
                url,
                response.status()
            )));
        }

        Ok(response)
    }
}
