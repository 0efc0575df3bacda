use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::warn;

use super::AlertSink;
use crate::monitor::CheckResult;

/// Appends every check result to a newline-delimited JSON file.
///
/// One object per check, not per transition. The line is the `CheckResult`
/// serialization itself, so the record shape stays stable for downstream log
/// consumers.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    async fn append(&self, result: &CheckResult) -> std::io::Result<()> {
        let mut line = serde_json::to_string(result)?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await
    }
}

#[async_trait]
impl AlertSink for FileSink {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn on_check_complete(&self, result: &CheckResult) {
        if let Err(e) = self.append(result).await {
            warn!(path = %self.path.display(), error = %e, "Failed to append check history");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::SiteStatus;

    #[tokio::test]
    async fn appends_one_parseable_line_per_check() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.jsonl");
        let sink = FileSink::new(&path);

        sink.on_check_complete(&CheckResult::up("https://example.com/", 200, 45.0))
            .await;
        sink.on_check_complete(&CheckResult::down(
            "https://example.com/",
            "Timeout after 10s",
        ))
        .await;

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: CheckResult = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.status, SiteStatus::Up);
        assert_eq!(first.status_code, Some(200));

        let second: CheckResult = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second.status, SiteStatus::Down);
        assert!(second.status_code.is_none());
    }

    #[tokio::test]
    async fn record_shape_keeps_null_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.jsonl");
        let sink = FileSink::new(&path);

        sink.on_check_complete(&CheckResult::down("https://example.com/", "refused"))
            .await;

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let line = content.lines().next().unwrap();
        assert!(line.contains("\"status_code\":null"));
        assert!(line.contains("\"response_time_ms\":null"));
        assert!(line.contains("\"timestamp\":"));
    }

    #[tokio::test]
    async fn unwritable_path_is_swallowed() {
        let sink = FileSink::new("/nonexistent/dir/history.jsonl");
        // Must not panic; the failure is logged and dropped.
        sink.on_check_complete(&CheckResult::up("https://example.com/", 200, 1.0))
            .await;
    }
}
