//! Resume checkpoint persistence.

use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};

/// Where the next run resumes: creator position and page offset within that creator.
///
/// `(0, 0)` means both "never ran" and "finished the full list last time".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    #[serde(alias = "last_artist_index")]
    pub creator_index: usize,
    #[serde(alias = "last_offset", default, deserialize_with = "null_as_zero")]
    pub page_offset: u64,
}

impl Checkpoint {
    pub fn new(creator_index: usize, page_offset: u64) -> Self {
        Self {
            creator_index,
            page_offset,
        }
    }

    pub fn is_start(&self) -> bool {
        self.creator_index == 0 && self.page_offset == 0
    }
}

fn null_as_zero<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u64, D::Error> {
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or(0))
}

/// JSON file holding a single [`Checkpoint`].
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the stored checkpoint. `Ok(None)` when no file exists.
    pub async fn load(&self) -> Result<Option<Checkpoint>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let checkpoint = serde_json::from_str(&content).map_err(|e| Error::Persistence {
            what: format!("checkpoint {}", self.path.display()),
            message: format!("unreadable: {}", e),
        })?;
        Ok(Some(checkpoint))
    }

    /// Replace the stored checkpoint.
    ///
    /// Writes a sibling temp file, syncs it and renames it over the target so a
    /// kill mid-write leaves either the old or the new value.
    pub async fn save(&self, checkpoint: Checkpoint) -> Result<()> {
        self.write(checkpoint).await.map_err(|e| Error::Persistence {
            what: format!("checkpoint {}", self.path.display()),
            message: e.to_string(),
        })
    }

    async fn write(&self, checkpoint: Checkpoint) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let data = serde_json::to_vec(&checkpoint)?;
        let tmp_path = self.path.with_extension("json.tmp");

        let mut file = tokio::fs::File::create(&tmp_path).await?;
        file.write_all(&data).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp_path, &self.path).await?;
        tracing::debug!(
            "Checkpoint saved: creator {} offset {}",
            checkpoint.creator_index,
            checkpoint.page_offset
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("progress.json"));
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("nested").join("progress.json"));

        store.save(Checkpoint::new(2, 48)).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(Checkpoint::new(2, 48)));

        store.save(Checkpoint::default()).await.unwrap();
        let loaded = store.load().await.unwrap().unwrap();
        assert!(loaded.is_start());
        assert!(!dir.path().join("nested").join("progress.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_reads_legacy_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        tokio::fs::write(&path, r#"{"last_artist_index": 3, "last_offset": 72}"#)
            .await
            .unwrap();

        let store = CheckpointStore::new(&path);
        assert_eq!(store.load().await.unwrap(), Some(Checkpoint::new(3, 72)));
    }

    #[tokio::test]
    async fn test_null_offset_reads_as_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        tokio::fs::write(&path, r#"{"last_artist_index": 1, "last_offset": null}"#)
            .await
            .unwrap();

        let store = CheckpointStore::new(&path);
        assert_eq!(store.load().await.unwrap(), Some(Checkpoint::new(1, 0)));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        tokio::fs::write(&path, "{not json").await.unwrap();

        let store = CheckpointStore::new(&path);
        assert!(matches!(
            store.load().await,
            Err(Error::Persistence { .. })
        ));
    }
}
