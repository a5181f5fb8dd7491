//! HTTP and local-file download transport.
//!
//! Every request is retried with a constant delay up to the configured
//! number of times. Client errors (4xx other than 408 and 429) are not
//! retried. `file://` URLs and plain paths are read from disk.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use backoff::backoff::Backoff;
use pack_script::{DownloadError, Downloader};
use reqwest::StatusCode;

use crate::config::RetryPolicy;
use crate::error::{Error, Result};

/// Constant delay, bounded number of retries.
#[derive(Debug, Clone)]
struct BoundedConstant {
    delay: Duration,
    max_retries: u32,
    attempts: u32,
}

impl BoundedConstant {
    fn new(policy: RetryPolicy) -> Self {
        Self {
            delay: policy.delay(),
            max_retries: policy.max_retries,
            attempts: 0,
        }
    }
}

impl Backoff for BoundedConstant {
    fn next_backoff(&mut self) -> Option<Duration> {
        if self.attempts >= self.max_retries {
            return None;
        }
        self.attempts += 1;
        Some(self.delay)
    }

    fn reset(&mut self) {
        self.attempts = 0;
    }
}

/// [`Downloader`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl HttpDownloader {
    pub fn new(retry: RetryPolicy) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("packsync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Client {
                message: e.to_string(),
            })?;
        Ok(Self { client, retry })
    }

    async fn fetch_bytes(&self, url: &str) -> std::result::Result<Vec<u8>, DownloadError> {
        let operation = || async {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| backoff::Error::transient(request_error(url, &e)))?;

            let status = response.status();
            if !status.is_success() {
                let error = DownloadError::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                };
                return Err(if is_retryable(status) {
                    backoff::Error::transient(error)
                } else {
                    backoff::Error::permanent(error)
                });
            }

            let body = response
                .bytes()
                .await
                .map_err(|e| backoff::Error::transient(request_error(url, &e)))?;
            Ok::<_, backoff::Error<DownloadError>>(body.to_vec())
        };

        backoff::future::retry_notify(
            BoundedConstant::new(self.retry),
            operation,
            |error: DownloadError, wait: Duration| {
                tracing::warn!(url, %error, retry_in = ?wait, "request failed, retrying");
            },
        )
        .await
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(&self, url: &str, dest: &Path) -> std::result::Result<(), DownloadError> {
        if url.trim().is_empty() {
            return Err(DownloadError::NoUrl);
        }
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| io_error(parent, source))?;
        }

        if let Some(path) = local_path(url) {
            tracing::debug!(src = %path.display(), dest = %dest.display(), "copying local file");
            tokio::fs::copy(&path, dest)
                .await
                .map_err(|source| io_error(&path, source))?;
            return Ok(());
        }

        let body = self.fetch_bytes(url).await?;
        tracing::debug!(url, bytes = body.len(), dest = %dest.display(), "downloaded");
        tokio::fs::write(dest, body)
            .await
            .map_err(|source| io_error(dest, source))
    }

    async fn fetch_text(&self, url: &str) -> std::result::Result<String, DownloadError> {
        if url.trim().is_empty() {
            return Err(DownloadError::NoUrl);
        }
        if let Some(path) = local_path(url) {
            return tokio::fs::read_to_string(&path)
                .await
                .map_err(|source| io_error(&path, source));
        }
        let body = self.fetch_bytes(url).await?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

/// `file://` URLs and strings without a scheme name local files.
fn local_path(url: &str) -> Option<PathBuf> {
    if let Some(path) = url.strip_prefix("file://") {
        return Some(PathBuf::from(path));
    }
    (!url.contains("://")).then(|| PathBuf::from(url))
}

fn is_retryable(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
}

fn request_error(url: &str, error: &reqwest::Error) -> DownloadError {
    DownloadError::Request {
        url: url.to_string(),
        message: error.to_string(),
    }
}

fn io_error(path: &Path, source: std::io::Error) -> DownloadError {
    DownloadError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_bounded_constant_stops_after_max_retries() {
        let mut backoff = BoundedConstant::new(RetryPolicy {
            max_retries: 2,
            delay_ms: 10,
        });
        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(10)));
        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(10)));
        assert_eq!(backoff.next_backoff(), None);
        backoff.reset();
        assert!(backoff.next_backoff().is_some());
    }

    #[rstest]
    #[case("file:///tmp/a.txt", Some("/tmp/a.txt"))]
    #[case("/srv/changelist", Some("/srv/changelist"))]
    #[case("https://example.com/a", None)]
    fn test_local_path(#[case] url: &str, #[case] expected: Option<&str>) {
        assert_eq!(local_path(url), expected.map(PathBuf::from));
    }

    #[rstest]
    #[case(StatusCode::INTERNAL_SERVER_ERROR, true)]
    #[case(StatusCode::TOO_MANY_REQUESTS, true)]
    #[case(StatusCode::NOT_FOUND, false)]
    #[case(StatusCode::FORBIDDEN, false)]
    fn test_retryable_statuses(#[case] status: StatusCode, #[case] expected: bool) {
        assert_eq!(is_retryable(status), expected);
    }

    #[tokio::test]
    async fn test_local_files_are_served_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("changelist.txt");
        std::fs::write(&src, "1.0.0 -> 1.0.1\nlog hi\n").unwrap();
        let downloader = HttpDownloader::new(RetryPolicy::default()).unwrap();

        let url = format!("file://{}", src.display());
        let text = downloader.fetch_text(&url).await.unwrap();
        assert!(text.starts_with("1.0.0 -> 1.0.1"));

        let dest = dir.path().join("copy/changelist.txt");
        downloader.download(src.to_str().unwrap(), &dest).await.unwrap();
        assert_eq!(std::fs::read_to_string(dest).unwrap(), "1.0.0 -> 1.0.1\nlog hi\n");
    }

    #[tokio::test]
    async fn test_missing_local_file_is_io_error() {
        let downloader = HttpDownloader::new(RetryPolicy::default()).unwrap();
        let err = downloader.fetch_text("/definitely/not/here").await.unwrap_err();
        assert!(matches!(err, DownloadError::Io { .. }));
    }
}
