//! On-disk cache for extracted scrape data.

use std::path::{Path, PathBuf};

use soulseed_shared::{Result, SoulseedError};
use tracing::info;

/// Directory that extracted payloads are written into. Created on first write.
#[derive(Debug, Clone)]
pub struct ScrapeCache {
    dir: PathBuf,
}

impl ScrapeCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `value` pretty-printed to `<stem>.json`, replacing any previous file.
    pub async fn write_json(&self, stem: &str, value: &serde_json::Value) -> Result<PathBuf> {
        let body = serde_json::to_string_pretty(value)?;
        self.write(&format!("{}.json", sanitize(stem)), &body).await
    }

    /// Write text content to `<stem>.<ext>`.
    pub async fn write_text(&self, stem: &str, ext: &str, body: &str) -> Result<PathBuf> {
        self.write(&format!("{}.{ext}", sanitize(stem)), body).await
    }

    async fn write(&self, file_name: &str, body: &str) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| SoulseedError::io(&self.dir, e))?;
        let path = self.dir.join(file_name);
        tokio::fs::write(&path, body)
            .await
            .map_err(|e| SoulseedError::io(&path, e))?;
        info!(path = %path.display(), bytes = body.len(), "scrape cache written");
        Ok(path)
    }
}

/// Keep file names to `[A-Za-z0-9_-]` so URL fragments cannot escape the cache dir.
fn sanitize(stem: &str) -> String {
    let cleaned: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();
    let trimmed = cleaned.trim_matches('-');
    if trimmed.is_empty() {
        "page".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_blocks_traversal() {
        assert_eq!(sanitize("nameberry-a"), "nameberry-a");
        assert_eq!(sanitize("../../etc/passwd"), "etc-passwd");
        assert_eq!(sanitize("///"), "page");
    }

    #[tokio::test]
    async fn writes_into_fresh_dir() {
        let dir = std::env::temp_dir().join(format!("ss_scrape_{}", uuid::Uuid::now_v7()));
        let cache = ScrapeCache::new(&dir);
        let path = cache
            .write_json("nameberry-b", &serde_json::json!([{ "name": "Bo" }]))
            .await
            .expect("write");
        assert_eq!(path, dir.join("nameberry-b.json"));
        let back: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back[0]["name"], "Bo");
    }
}
