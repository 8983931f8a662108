//! Pluggable text sources.
//!
//! The dataset and the credits file are plain text resources addressed by a
//! path (`data.tsv`, `credits.txt`). Where they come from is abstracted
//! behind [`TextSource`] so the app, tests and embedders can swap transports:
//!
//!   * [`GithubSource`]: the repository contents API, raw media type
//!   * [`DirectorySource`]: a local checkout or mirror
//!
//! Loaders on top of a source parse the text into a [`Dataset`] or
//! [`Credits`]. They report failures to the caller; deciding to degrade to
//! an empty dataset happens one level up (see `facade::Catalog`).
//!
//! Usage (example skeleton):
//! ```ignore
//! let source = source_from_config(&config.source)?;
//! let dataset = load_dataset(source.as_ref(), &config.source.data_path).await?;
//! ```

use std::path::PathBuf;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use tracing::{debug, info};

use crate::config::SourceConfig;
use crate::credits::Credits;
use crate::dataset::{self, Dataset};
use crate::errors::{CspBypassError, IoResultExt, Result};

/// Media type that makes the contents API return the file body itself.
pub const GITHUB_RAW_MEDIA_TYPE: &str = "application/vnd.github.v3.raw";

/// Capability to fetch a text resource by identifier.
#[async_trait]
pub trait TextSource: Send + Sync {
    fn name(&self) -> &'static str;
    async fn fetch(&self, resource: &str) -> Result<String>;
}

/* -------------------------------------------------------------------------- */
/*                            Source Implementations                          */
/* -------------------------------------------------------------------------- */

/// Repository file through the GitHub contents API.
pub struct GithubSource {
    client: reqwest::Client,
    api_base: String,
    owner: String,
    repo: String,
    branch: String,
    timeout_secs: u64,
}

impl GithubSource {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_RAW_MEDIA_TYPE));
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()
            .map_err(|e| CspBypassError::internal_with("failed to build HTTP client", e))?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            owner: config.owner.clone(),
            repo: config.repo.clone(),
            branch: config.branch.clone(),
            timeout_secs: config.request_timeout.as_secs(),
        })
    }

    /// Contents API URL of a repository file.
    pub fn url_for(&self, resource: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}?ref={}",
            self.api_base,
            self.owner,
            self.repo,
            resource.trim_start_matches('/'),
            self.branch
        )
    }
}

#[async_trait]
impl TextSource for GithubSource {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn fetch(&self, resource: &str) -> Result<String> {
        let url = self.url_for(resource);
        debug!(%url, "fetching repository file");

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                CspBypassError::timeout(&url, self.timeout_secs)
            } else {
                CspBypassError::network("fetch", &url, e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CspBypassError::http_status(&url, status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| CspBypassError::network("read body", &url, e))?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| CspBypassError::invalid_encoding(resource, e.to_string()))
    }
}

/// Files below a local directory.
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, resource: &str) -> PathBuf {
        self.root.join(resource.trim_start_matches('/'))
    }
}

#[async_trait]
impl TextSource for DirectorySource {
    fn name(&self) -> &'static str {
        "directory"
    }

    async fn fetch(&self, resource: &str) -> Result<String> {
        let path = self.path_for(resource);
        debug!(path = %path.display(), "reading local file");
        let bytes = tokio::fs::read(&path)
            .await
            .with_path(path.display().to_string(), "read")?;
        String::from_utf8(bytes)
            .map_err(|e| CspBypassError::invalid_encoding(resource, e.to_string()))
    }
}

/// Pick the source described by the configuration.
pub fn source_from_config(config: &SourceConfig) -> Result<Box<dyn TextSource>> {
    match config.local_dir {
        Some(ref dir) => Ok(Box::new(DirectorySource::new(dir.clone()))),
        None => Ok(Box::new(GithubSource::new(config)?)),
    }
}

/* -------------------------------------------------------------------------- */
/*                                   Loaders                                  */
/* -------------------------------------------------------------------------- */

/// Fetch and parse the dataset.
pub async fn load_dataset(source: &dyn TextSource, resource: &str) -> Result<Dataset> {
    let raw = source.fetch(resource).await?;
    let dataset = dataset::parse(&raw);
    info!(
        source = source.name(),
        resource,
        records = dataset.len(),
        "dataset loaded"
    );
    Ok(dataset)
}

/// Fetch and parse the credits file.
pub async fn load_credits(source: &dyn TextSource, resource: &str) -> Result<Credits> {
    let raw = source.fetch(resource).await?;
    let credits = Credits::parse(&raw);
    debug!(source = source.name(), names = credits.names().len(), "credits loaded");
    Ok(credits)
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    /// In-memory source for tests.
    #[derive(Default)]
    pub struct MemorySource {
        files: HashMap<String, String>,
        latency: HashMap<String, Duration>,
        pub fetches: AtomicUsize,
    }

    impl MemorySource {
        pub fn with(mut self, resource: &str, body: &str) -> Self {
            self.files.insert(resource.to_string(), body.to_string());
            self
        }

        /// Delay every fetch of `resource` by `delay`.
        pub fn with_latency(mut self, resource: &str, delay: Duration) -> Self {
            self.latency.insert(resource.to_string(), delay);
            self
        }
    }

    #[async_trait]
    impl TextSource for MemorySource {
        fn name(&self) -> &'static str {
            "memory"
        }

        async fn fetch(&self, resource: &str) -> Result<String> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.latency.get(resource) {
                tokio::time::sleep(*delay).await;
            }
            self.files.get(resource).cloned().ok_or_else(|| {
                CspBypassError::io(
                    resource,
                    "read",
                    std::io::Error::new(std::io::ErrorKind::NotFound, "no such resource"),
                )
            })
        }
    }
}
