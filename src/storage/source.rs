//! Chapter payload sources
//!
//! Payloads are addressed by global chapter id: `{base}/{id}.{ext}`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::ChapterRef;
use crate::pipeline::{ChapterSource, FetchError};

const USER_AGENT: &str = concat!("bsb-plan/", env!("CARGO_PKG_VERSION"));

/// Fetches payloads over HTTP
pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
    extension: String,
}

impl HttpSource {
    pub fn new(base_url: &str, extension: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            extension: extension.to_string(),
        })
    }

    pub fn url_for(&self, chapter: &ChapterRef) -> String {
        format!("{}/{}.{}", self.base_url, chapter.global_id, self.extension)
    }
}

#[async_trait]
impl ChapterSource for HttpSource {
    async fn fetch(&self, chapter: &ChapterRef) -> Result<Vec<u8>, FetchError> {
        let url = self.url_for(chapter);
        tracing::trace!(url = %url, "GET chapter");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(url));
        }

        if !status.is_success() {
            return Err(FetchError::Network(format!("HTTP {} from {}", status.as_u16(), url)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(bytes.to_vec())
    }
}

/// Reads payloads from a local directory
pub struct DirSource {
    root: PathBuf,
    extension: String,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>, extension: &str) -> Self {
        Self {
            root: root.into(),
            extension: extension.to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, chapter: &ChapterRef) -> PathBuf {
        self.root
            .join(format!("{}.{}", chapter.global_id, self.extension))
    }
}

#[async_trait]
impl ChapterSource for DirSource {
    async fn fetch(&self, chapter: &ChapterRef) -> Result<Vec<u8>, FetchError> {
        let path = self.path_for(chapter);

        tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => FetchError::NotFound(path.display().to_string()),
            _ => FetchError::Io(format!("{}: {}", path.display(), e)),
        })
    }
}
