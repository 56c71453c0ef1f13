//! OAuth client-credentials exchange.

use reqwest::Client;

use crate::api::types::TokenResponse;
use crate::error::{Error, Result};

/// Path of the token endpoint relative to the API base.
const TOKEN_PATH: &str = "/oauth2/token";

/// Exchanges application credentials for a bearer token.
///
/// A single call performs a single exchange: retrying is left to the caller.
#[derive(Debug, Clone)]
pub struct CredentialProvider {
    client: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl CredentialProvider {
    pub fn new(client: Client, base_url: &str, client_id: String, client_secret: String) -> Self {
        Self {
            client,
            token_url: format!("{}{}", base_url.trim_end_matches('/'), TOKEN_PATH),
            client_id,
            client_secret,
        }
    }

    /// Obtain a fresh access token.
    pub async fn acquire(&self) -> Result<String> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];

        let response = self
            .client
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::Authentication(format!("token exchange failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Authentication(format!(
                "HTTP {}: {}",
                status,
                truncate(&body, 200)
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| Error::Authentication(format!("unreadable token response: {}", e)))?;
        let token: TokenResponse = serde_json::from_str(&text).map_err(|e| {
            Error::Authentication(format!("token response missing access_token: {}", e))
        })?;

        if token.access_token.is_empty() {
            return Err(Error::Authentication("empty access_token".into()));
        }

        tracing::info!("Authenticated successfully");
        Ok(token.access_token)
    }
}

/// Cut a response body down for log and error messages.
pub(crate) fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_url_joins_base() {
        let provider = CredentialProvider::new(
            Client::new(),
            "https://www.deviantart.com/",
            "id".into(),
            "secret".into(),
        );
        assert_eq!(provider.token_url, "https://www.deviantart.com/oauth2/token");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("short", 200), "short");
    }
}
