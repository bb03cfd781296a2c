use crate::error::SourceError;
use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Retrieves raw image bytes. Production uses HTTP; tests substitute fixtures.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, SourceError>;
}

pub struct ReqwestImageFetcher {
    client: reqwest::Client,
}

impl ReqwestImageFetcher {
    pub fn new() -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (compatible; cinepick)")
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SourceError::new(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ImageFetcher for ReqwestImageFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, SourceError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::image(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::image(url, format!("HTTP {}", status)));
        }

        let bytes = response.bytes().await.map_err(|e| SourceError::image(url, e))?;
        Ok(bytes.to_vec())
    }
}

/// Poster files under `<static_dir>/images/`. Paths handed back are relative to `static_dir`.
#[derive(Clone)]
pub struct ImageStore {
    static_dir: PathBuf,
    fetcher: Arc<dyn ImageFetcher>,
}

impl ImageStore {
    pub fn new(static_dir: impl Into<PathBuf>, fetcher: Arc<dyn ImageFetcher>) -> Self {
        Self {
            static_dir: static_dir.into(),
            fetcher,
        }
    }

    pub fn static_dir(&self) -> &Path {
        &self.static_dir
    }

    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.static_dir.join(relative)
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.resolve(relative).is_file()
    }

    /// Download `url` to `relative`, returning `relative` once the file is in place.
    ///
    /// Bytes land in a uniquely named temp file beside the target, then persist
    /// over it. A failed download leaves nothing at the final path.
    pub async fn download(&self, url: &str, relative: &str) -> Result<String, SourceError> {
        let bytes = self.fetcher.fetch(url).await?;
        if bytes.is_empty() {
            return Err(SourceError::image(url, "empty response body"));
        }

        let target = self.resolve(relative);
        let dir = target
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.static_dir.clone());
        tokio::fs::create_dir_all(&dir).await?;

        let len = bytes.len();
        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            let mut temp = tempfile::NamedTempFile::new_in(&dir)?;
            temp.write_all(&bytes)?;
            temp.flush()?;
            temp.persist(&target).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| SourceError::image(url, format!("write task failed: {}", e)))??;

        debug!(url = %url, path = %relative, bytes = len, "Image saved");
        Ok(relative.to_string())
    }
}

/// Every character that is not alphanumeric becomes `_`.
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

/// `images/<title>_<year>.jpg`
pub fn poster_path(title: &str, year: &str) -> String {
    format!("images/{}_{}.jpg", sanitize_title(title), sanitize_title(year))
}

/// `images/<title>_<year>_large.jpg`
pub fn large_poster_path(title: &str, year: &str) -> String {
    format!("images/{}_{}_large.jpg", sanitize_title(title), sanitize_title(year))
}
