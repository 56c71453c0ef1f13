//! Text sidecar written next to every mirrored item.

use std::path::Path;

use tokio::io::AsyncWriteExt;

use crate::error::Result;

/// Heading of the enrichment section appended after the tag list.
pub const LABELS_HEADING: &str = "# AI tags";

/// Render the sidecar body: header lines, a blank line, then one tag per line.
pub fn format_sidecar(title: &str, creator: &str, url: &str, tags: &[String]) -> String {
    format!(
        "title: {}\nartist: {}\nurl: {}\n\n{}\n",
        title,
        creator,
        url,
        tags.join("\n")
    )
}

/// Write (or overwrite) the sidecar.
pub async fn write_sidecar(
    path: &Path,
    title: &str,
    creator: &str,
    url: &str,
    tags: &[String],
) -> Result<()> {
    tokio::fs::write(path, format_sidecar(title, creator, url, tags)).await?;
    Ok(())
}

/// Append enrichment labels under their own heading.
pub async fn append_labels(path: &Path, labels: &[String]) -> Result<()> {
    if labels.is_empty() {
        return Ok(());
    }

    let mut file = tokio::fs::OpenOptions::new()
        .append(true)
        .open(path)
        .await?;
    file.write_all(format!("\n{}\n{}\n", LABELS_HEADING, labels.join("\n")).as_bytes())
        .await?;
    file.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_sidecar() {
        let text = format_sidecar(
            "Sunset",
            "alice",
            "https://example.com/art/sunset-1",
            &["sky".to_string(), "orange".to_string()],
        );
        assert_eq!(
            text,
            "title: Sunset\nartist: alice\nurl: https://example.com/art/sunset-1\n\nsky\norange\n"
        );
    }

    #[tokio::test]
    async fn test_append_labels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("d1.txt");

        write_sidecar(&path, "T", "alice", "u", &[]).await.unwrap();
        append_labels(&path, &["cat".to_string(), "outdoors".to_string()])
            .await
            .unwrap();
        append_labels(&path, &[]).await.unwrap();

        let text = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(
            text,
            "title: T\nartist: alice\nurl: u\n\n\n\n# AI tags\ncat\noutdoors\n"
        );
    }
}
