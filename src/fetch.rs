//! Resource transport used by the sprite resolver.
//!
//! The engine never talks to the network directly. It asks a
//! [`ResourceFetcher`] for the raw bytes behind a URL or path and relies on the
//! fetcher to tell "not found" apart from every other failure.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

/// Error type for resource fetches.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("Resource not found: {url}")]
    NotFound { url: String },
    #[error("Failed to fetch {url}: {message}")]
    Transport { url: String, message: String },
}

impl FetchError {
    pub fn not_found(url: impl Into<String>) -> Self {
        FetchError::NotFound { url: url.into() }
    }

    pub fn transport(url: impl Into<String>, message: impl ToString) -> Self {
        FetchError::Transport {
            url: url.into(),
            message: message.to_string(),
        }
    }

    pub fn url(&self) -> &str {
        match self {
            FetchError::NotFound { url } | FetchError::Transport { url, .. } => url,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound { .. })
    }
}

/// Fetch capability returning the raw bytes of a resource.
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

#[async_trait]
impl<T: ResourceFetcher + ?Sized> ResourceFetcher for Arc<T> {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        (**self).fetch(url).await
    }
}

/// Reads resources from the local filesystem.
///
/// Accepts plain paths and `file://` URLs. Relative paths are resolved
/// against `root` when one is set, otherwise against the working directory.
#[derive(Debug, Clone, Default)]
pub struct FileFetcher {
    root: Option<PathBuf>,
}

impl FileFetcher {
    pub fn new() -> Self {
        Self { root: None }
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn local_path(&self, url: &str) -> Result<PathBuf, FetchError> {
        if url.starts_with("file://") {
            let parsed = url::Url::parse(url).map_err(|e| FetchError::transport(url, e))?;
            return parsed
                .to_file_path()
                .map_err(|_| FetchError::transport(url, "not a local file URL"));
        }
        if url.contains("://") {
            return Err(FetchError::transport(url, "unsupported scheme for file fetcher"));
        }
        // Query strings carry tokens for remote hosts and mean nothing on disk.
        let path = Path::new(url.split('?').next().unwrap_or(url));
        Ok(match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        })
    }
}

#[async_trait]
impl ResourceFetcher for FileFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let path = self.local_path(url)?;
        log::debug!("reading {}", path.display());
        std::fs::read(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => FetchError::not_found(url),
            _ => FetchError::transport(url, e),
        })
    }
}

/// Fetches resources over HTTP(S).
#[cfg(feature = "http")]
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

#[cfg(feature = "http")]
impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl ResourceFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::transport(url, e))?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::not_found(url));
        }
        if !status.is_success() {
            return Err(FetchError::transport(url, format!("HTTP {}", status)));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::transport(url, e))?;
        Ok(bytes.to_vec())
    }
}
