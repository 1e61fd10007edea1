use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::AppError;

/// Client-side save of a file the store has exposed through a short-lived URL.
#[async_trait]
pub trait DownloadHandler: Send + Sync {
    async fn save(&self, file_name: &str, url: &str) -> Result<PathBuf, AppError>;
}

/// Fetches the URL and writes the body into a download directory.
pub struct HttpDownloader {
    client: reqwest::Client,
    target_dir: PathBuf,
}

impl HttpDownloader {
    pub fn new(target_dir: PathBuf, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, target_dir })
    }
}

/// First free path for `file_name` in `dir`: `name.ext`, `name (1).ext`, ...
pub fn unique_target(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let (stem, ext) = match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (file_name, None),
    };
    (1..)
        .map(|n| match ext {
            Some(ext) => dir.join(format!("{stem} ({n}).{ext}")),
            None => dir.join(format!("{stem} ({n})")),
        })
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

#[async_trait]
impl DownloadHandler for HttpDownloader {
    async fn save(&self, file_name: &str, url: &str) -> Result<PathBuf, AppError> {
        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(AppError::Network(format!(
                "download failed with status {}",
                resp.status().as_u16()
            )));
        }
        let bytes = resp.bytes().await?;

        tokio::fs::create_dir_all(&self.target_dir).await?;
        let target = unique_target(&self.target_dir, file_name);
        tokio::fs::write(&target, &bytes).await?;
        tracing::info!(file = file_name, target = %target.display(), "download saved");
        Ok(target)
    }
}
