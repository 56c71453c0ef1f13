//! Item ledger.
//!
//! Durable SQLite record of every item the mirror has handled. The ledger is
//! the deduplication authority: an item with a row is never fetched again, and
//! a row flagged restricted stays restricted until explicitly cleared.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use deviantart_downloader::Ledger;
//!
//! # async fn example() -> deviantart_downloader::Result<()> {
//! let ledger = Ledger::open(Path::new("downloads/deviantart.db")).await?;
//! if !ledger.is_known("d1").await? {
//!     ledger
//!         .record_downloaded("d1", "alice", "Sunset", "https://example.com/d1", &[])
//!         .await?;
//! }
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::time::Duration;

use chrono::NaiveDateTime;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::Row;
use tracing::instrument;

use crate::error::Result;

/// Wait this long on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const CREATE_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS downloads (
    deviationid TEXT PRIMARY KEY,
    artist TEXT,
    title TEXT,
    url TEXT,
    tags TEXT,
    is_premium INTEGER NOT NULL DEFAULT 0,
    downloaded_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)";

/// A ledger row.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub id: String,
    pub creator: String,
    pub title: String,
    pub url: String,
    pub tags: Vec<String>,
    pub restricted: bool,
    pub recorded_at: Option<NaiveDateTime>,
}

/// Row counts by disposition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerCounts {
    pub downloaded: u64,
    pub restricted: u64,
}

/// SQLite-backed item ledger.
#[derive(Debug, Clone)]
pub struct Ledger {
    pool: SqlitePool,
}

impl Ledger {
    /// Open (or create) the ledger at `path` and bring its schema up to date.
    #[instrument(skip(path), fields(path = %path.display()))]
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Full)
            .busy_timeout(BUSY_TIMEOUT);

        // One writer, one statement at a time.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let ledger = Self { pool };
        ledger.migrate().await?;
        Ok(ledger)
    }

    /// In-memory ledger for tests.
    pub async fn open_in_memory() -> Result<Self> {
        // The database lives only as long as its single connection.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        let ledger = Self { pool };
        ledger.migrate().await?;
        Ok(ledger)
    }

    /// Create the table and add the restricted column to stores that predate it.
    async fn migrate(&self) -> Result<()> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;

        let columns = sqlx::query("PRAGMA table_info(downloads)")
            .fetch_all(&self.pool)
            .await?;
        let has_restricted = columns
            .iter()
            .any(|row| {
                row.try_get::<String, _>("name")
                    .map(|name| name == "is_premium")
                    .unwrap_or(false)
            });

        if !has_restricted {
            sqlx::query("ALTER TABLE downloads ADD COLUMN is_premium INTEGER NOT NULL DEFAULT 0")
                .execute(&self.pool)
                .await?;
            tracing::info!("Added 'is_premium' column to ledger");
        } else {
            tracing::debug!("Ledger schema up to date");
        }

        Ok(())
    }

    /// Whether any row exists for `id`, restricted or not.
    pub async fn is_known(&self, id: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM downloads WHERE deviationid = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Whether a row exists for `id` and is flagged restricted.
    pub async fn is_restricted(&self, id: &str) -> Result<bool> {
        let flag: Option<i64> =
            sqlx::query_scalar("SELECT is_premium FROM downloads WHERE deviationid = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(flag == Some(1))
    }

    /// Flag `id` as restricted. No-op if a row already exists.
    pub async fn record_restricted(
        &self,
        id: &str,
        creator: &str,
        title: &str,
        url: &str,
    ) -> Result<bool> {
        let result = sqlx::query(
            r"INSERT OR IGNORE INTO downloads (deviationid, artist, title, url, tags, is_premium)
              VALUES (?, ?, ?, ?, '', 1)",
        )
        .bind(id)
        .bind(creator)
        .bind(title)
        .bind(url)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record `id` as downloaded. No-op if a row already exists.
    pub async fn record_downloaded(
        &self,
        id: &str,
        creator: &str,
        title: &str,
        url: &str,
        tags: &[String],
    ) -> Result<bool> {
        let result = sqlx::query(
            r"INSERT OR IGNORE INTO downloads (deviationid, artist, title, url, tags, is_premium)
              VALUES (?, ?, ?, ?, ?, 0)",
        )
        .bind(id)
        .bind(creator)
        .bind(title)
        .bind(url)
        .bind(tags.join("\n"))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Fetch the row for `id`.
    pub async fn get(&self, id: &str) -> Result<Option<LedgerEntry>> {
        let row = sqlx::query(
            r"SELECT deviationid, artist, title, url, tags, is_premium, downloaded_at
              FROM downloads WHERE deviationid = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let tags: Option<String> = row.try_get("tags")?;
        let flag: i64 = row.try_get("is_premium")?;

        Ok(Some(LedgerEntry {
            id: row.try_get("deviationid")?,
            creator: row.try_get::<Option<String>, _>("artist")?.unwrap_or_default(),
            title: row.try_get::<Option<String>, _>("title")?.unwrap_or_default(),
            url: row.try_get::<Option<String>, _>("url")?.unwrap_or_default(),
            tags: tags
                .unwrap_or_default()
                .lines()
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
            restricted: flag == 1,
            recorded_at: row
                .try_get::<Option<NaiveDateTime>, _>("downloaded_at")
                .ok()
                .flatten(),
        }))
    }

    /// Remove the restricted row for `id` so the next pass classifies it again.
    pub async fn clear_restricted(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM downloads WHERE deviationid = ? AND is_premium = 1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove every restricted row. Returns how many were cleared.
    pub async fn clear_all_restricted(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM downloads WHERE is_premium = 1")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Row counts by disposition.
    pub async fn counts(&self) -> Result<LedgerCounts> {
        let (downloaded, restricted): (i64, i64) = sqlx::query_as(
            r"SELECT
                COALESCE(SUM(CASE WHEN is_premium = 1 THEN 0 ELSE 1 END), 0),
                COALESCE(SUM(CASE WHEN is_premium = 1 THEN 1 ELSE 0 END), 0)
              FROM downloads",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(LedgerCounts {
            downloaded: downloaded.max(0) as u64,
            restricted: restricted.max(0) as u64,
        })
    }

    /// Close the underlying pool.
    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|t| t.to_string()).collect()
    }

    #[tokio::test]
    async fn test_unknown_item() {
        let ledger = Ledger::open_in_memory().await.unwrap();
        assert!(!ledger.is_known("d1").await.unwrap());
        assert!(!ledger.is_restricted("d1").await.unwrap());
        assert_eq!(ledger.get("d1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_record_downloaded_first_call_wins() {
        let ledger = Ledger::open_in_memory().await.unwrap();

        assert!(ledger
            .record_downloaded("d1", "alice", "First", "u1", &tags(&["a", "b"]))
            .await
            .unwrap());
        assert!(!ledger
            .record_downloaded("d1", "bob", "Second", "u2", &tags(&["c"]))
            .await
            .unwrap());

        let entry = ledger.get("d1").await.unwrap().unwrap();
        assert_eq!(entry.creator, "alice");
        assert_eq!(entry.title, "First");
        assert_eq!(entry.url, "u1");
        assert_eq!(entry.tags, tags(&["a", "b"]));
        assert!(!entry.restricted);
        assert!(entry.recorded_at.is_some());
        assert_eq!(ledger.counts().await.unwrap().downloaded, 1);
    }

    #[tokio::test]
    async fn test_record_restricted_is_idempotent() {
        let ledger = Ledger::open_in_memory().await.unwrap();

        ledger
            .record_restricted("p1", "alice", "Locked", "u")
            .await
            .unwrap();
        ledger
            .record_restricted("p1", "alice", "Renamed", "u")
            .await
            .unwrap();

        let entry = ledger.get("p1").await.unwrap().unwrap();
        assert_eq!(entry.title, "Locked");
        assert!(entry.restricted);
        assert!(entry.tags.is_empty());
        assert_eq!(
            ledger.counts().await.unwrap(),
            LedgerCounts {
                downloaded: 0,
                restricted: 1
            }
        );
    }

    #[tokio::test]
    async fn test_restricted_is_write_once() {
        let ledger = Ledger::open_in_memory().await.unwrap();

        ledger.record_restricted("p1", "alice", "Locked", "u").await.unwrap();
        ledger
            .record_downloaded("p1", "alice", "Locked", "u", &tags(&["x"]))
            .await
            .unwrap();

        assert!(ledger.is_restricted("p1").await.unwrap());
        assert!(ledger.is_known("p1").await.unwrap());
    }

    #[tokio::test]
    async fn test_downloaded_is_never_flagged_later() {
        let ledger = Ledger::open_in_memory().await.unwrap();

        ledger.record_downloaded("d1", "alice", "T", "u", &[]).await.unwrap();
        ledger.record_restricted("d1", "alice", "T", "u").await.unwrap();

        assert!(!ledger.is_restricted("d1").await.unwrap());
    }

    #[tokio::test]
    async fn test_clear_restricted_only_touches_restricted_rows() {
        let ledger = Ledger::open_in_memory().await.unwrap();

        ledger.record_restricted("p1", "alice", "T", "u").await.unwrap();
        ledger.record_restricted("p2", "alice", "T", "u").await.unwrap();
        ledger.record_downloaded("d1", "alice", "T", "u", &[]).await.unwrap();

        assert!(!ledger.clear_restricted("d1").await.unwrap());
        assert!(ledger.clear_restricted("p1").await.unwrap());
        assert!(!ledger.is_known("p1").await.unwrap());

        assert_eq!(ledger.clear_all_restricted().await.unwrap(), 1);
        assert!(!ledger.is_known("p2").await.unwrap());
        assert!(ledger.is_known("d1").await.unwrap());
    }

    #[tokio::test]
    async fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("ledger.db");

        let ledger = Ledger::open(&path).await.unwrap();
        ledger.record_restricted("p1", "alice", "T", "u").await.unwrap();
        ledger.close().await;

        let reopened = Ledger::open(&path).await.unwrap();
        assert!(reopened.is_restricted("p1").await.unwrap());
    }

    #[tokio::test]
    async fn test_upgrades_store_without_restricted_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.db");

        {
            let options = SqliteConnectOptions::new()
                .filename(&path)
                .create_if_missing(true);
            let pool = SqlitePoolOptions::new()
                .max_connections(1)
                .connect_with(options)
                .await
                .unwrap();
            sqlx::query(
                r"CREATE TABLE downloads (
                    deviationid TEXT PRIMARY KEY,
                    artist TEXT,
                    title TEXT,
                    url TEXT,
                    tags TEXT,
                    downloaded_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
                )",
            )
            .execute(&pool)
            .await
            .unwrap();
            sqlx::query(
                "INSERT INTO downloads (deviationid, artist, title, url, tags) VALUES ('old', 'alice', 'Old', 'u', 'x\ny')",
            )
            .execute(&pool)
            .await
            .unwrap();
            pool.close().await;
        }

        let ledger = Ledger::open(&path).await.unwrap();
        let entry = ledger.get("old").await.unwrap().unwrap();
        assert!(!entry.restricted);
        assert_eq!(entry.tags, tags(&["x", "y"]));
        ledger.close().await;

        // Opening an already-upgraded store must not fail.
        let again = Ledger::open(&path).await.unwrap();
        assert!(again.is_known("old").await.unwrap());
    }
}
