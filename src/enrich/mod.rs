//! Best-effort enrichment of downloaded assets.
//!
//! An [`Enricher`] turns a saved asset into a list of labels that are
//! appended to the item's sidecar. Failures never affect the item itself.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client};
use serde::Deserialize;

use crate::error::{Error, Result};

/// The tagger can be slow on large images.
const TAGGER_TIMEOUT: Duration = Duration::from_secs(60);

/// Produces labels for a saved asset.
#[async_trait]
pub trait Enricher: Send + Sync {
    async fn labels(&self, asset: &Path) -> Result<Vec<String>>;
}

/// Client for the auto-tagger classification service.
#[derive(Debug, Clone)]
pub struct AutoTagger {
    client: Client,
    endpoint: String,
}

impl AutoTagger {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(TAGGER_TIMEOUT)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create tagger client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl Enricher for AutoTagger {
    async fn labels(&self, asset: &Path) -> Result<Vec<String>> {
        let bytes = tokio::fs::read(asset)
            .await
            .map_err(|e| Error::Enrichment(format!("{}: {}", asset.display(), e)))?;

        let file_name = asset
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("asset")
            .to_string();

        let form = multipart::Form::new()
            .part("file", multipart::Part::bytes(bytes).file_name(file_name))
            .text("format", "json");

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Enrichment(format!("{}: {}", self.endpoint, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Enrichment(format!(
                "{}: HTTP {}",
                self.endpoint, status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::Enrichment(format!("{}: {}", self.endpoint, e)))?;

        parse_labels(&body)
    }
}

/// One evaluated image in the tagger response.
#[derive(Debug, Deserialize)]
struct Evaluation {
    #[serde(default)]
    tags: HashMap<String, f64>,
}

/// Label names of the first evaluation, most confident first.
fn parse_labels(body: &str) -> Result<Vec<String>> {
    let evaluations: Vec<Evaluation> = serde_json::from_str(body)
        .map_err(|e| Error::Enrichment(format!("unexpected tagger response: {}", e)))?;

    let Some(first) = evaluations.into_iter().next() else {
        return Ok(Vec::new());
    };

    let mut scored: Vec<(String, f64)> = first.tags.into_iter().collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    Ok(scored.into_iter().map(|(label, _)| label).collect())
}
