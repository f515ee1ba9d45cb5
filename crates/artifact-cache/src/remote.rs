use crate::ArtifactCache;
use async_trait::async_trait;
use backoff::backoff::Backoff as _;
use backoff::ExponentialBackoffBuilder;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// HTTP-backed artifact cache tier.
///
/// Entries are addressed as `{base_url}/{key}`: `HEAD` for [`has`][Self],
/// `GET`/`PUT` with a zstd-compressed tar body for
/// [`use_cached_files`][Self]/[`insert`][Self]. Requests are retried with
/// exponential backoff on transient failures (connection errors, 5xx);
/// a 404 is a plain miss and isn't retried.
pub struct RemoteArtifactCache {
    client: reqwest::Client,
    base_url: String,
    max_attempts: u32,
}

impl RemoteArtifactCache {
    /// Point a cache tier at `base_url` (no trailing slash required).
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            max_attempts: 3,
        }
    }

    /// Override the number of attempts per request (default 3).
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    fn entry_url(&self, key: &str) -> String {
        format!("{}/{key}", self.base_url.trim_end_matches('/'))
    }

    async fn retry<F, Fut, T>(&self, operation_name: &str, mut f: F) -> Option<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<Option<T>, reqwest::Error>>,
    {
        let mut backoff = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(100))
            .with_max_elapsed_time(Some(Duration::from_secs(10)))
            .build();
        let mut attempts = 0;

        loop {
            attempts += 1;
            match f().await {
                Ok(outcome) => return outcome,
                Err(err) if attempts >= self.max_attempts => {
                    tracing::warn!(operation = operation_name, attempts, error = %err, "remote artifact cache request exhausted retries");
                    return None;
                }
                Err(err) => {
                    let Some(wait) = backoff.next_backoff() else {
                        tracing::warn!(operation = operation_name, error = %err, "remote artifact cache backoff exhausted");
                        return None;
                    };
                    tracing::debug!(operation = operation_name, attempts, error = %err, retry_in_ms = wait.as_millis(), "retrying remote artifact cache request");
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }
}

#[async_trait]
impl ArtifactCache for RemoteArtifactCache {
    async fn has(&self, key: &str) -> bool {
        let url = self.entry_url(key);
        self.retry("has", || {
            let client = &self.client;
            let url = url.clone();
            async move {
                let resp = client.head(&url).send().await?;
                Ok(Some(resp.status().is_success()))
            }
        })
        .await
        .unwrap_or(false)
    }

    async fn use_cached_files(&self, key: &str, dest_root: &Path) -> bool {
        let url = self.entry_url(key);
        let bytes = self
            .retry("fetch", || {
                let client = &self.client;
                let url = url.clone();
                async move {
                    let resp = client.get(&url).send().await?;
                    if resp.status() == reqwest::StatusCode::NOT_FOUND {
                        return Ok(None);
                    }
                    let resp = resp.error_for_status()?;
                    Ok(Some(resp.bytes().await?))
                }
            })
            .await;

        let Some(bytes) = bytes.flatten() else {
            return false;
        };

        match extract_bytes(&bytes[..], dest_root) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(key, error = %e, "remote artifact cache entry corrupt");
                false
            }
        }
    }

    async fn insert(&self, key: &str, file_paths: &[PathBuf]) {
        let body = match archive_bytes(file_paths) {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to archive files for remote artifact cache");
                return;
            }
        };

        let url = self.entry_url(key);
        let sent = self
            .retry("insert", || {
                let client = &self.client;
                let url = url.clone();
                let body = body.clone();
                async move {
                    client.put(&url).body(body).send().await?.error_for_status()?;
                    Ok(Some(()))
                }
            })
            .await;

        if sent.is_none() {
            tracing::warn!(key, "failed to write remote artifact cache entry");
        }
    }
}

fn archive_bytes(file_paths: &[PathBuf]) -> crate::Result<Vec<u8>> {
    let enc = zstd::Encoder::new(Vec::new(), 3).map_err(|e| crate::Error::Archive(e.to_string()))?;
    let mut builder = tar::Builder::new(enc);
    for path in file_paths {
        let Some(name) = path.file_name() else { continue };
        builder
            .append_path_with_name(path, name)
            .map_err(|e| crate::Error::io(e, path, "tar append"))?;
    }
    let enc = builder
        .into_inner()
        .map_err(|e| crate::Error::Archive(e.to_string()))?;
    enc.finish().map_err(|e| crate::Error::Archive(e.to_string()))
}

fn extract_bytes(bytes: &[u8], dest_root: &Path) -> crate::Result<()> {
    let dec = zstd::Decoder::new(bytes).map_err(|e| crate::Error::Archive(e.to_string()))?;
    let mut archive = tar::Archive::new(dec);
    std::fs::create_dir_all(dest_root).map_err(|e| crate::Error::io(e, dest_root, "create_dir_all"))?;
    archive
        .unpack(dest_root)
        .map_err(|e| crate::Error::io(e, dest_root, "unpack"))?;
    Ok(())
}
