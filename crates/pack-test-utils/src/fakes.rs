//! Scripted stand-ins for the network and archive capabilities.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use pack_script::{DecompressError, Decompressor, DownloadError, Downloader};

/// Serves canned bodies by URL; any other URL fails with a 404 status.
#[derive(Debug, Default)]
pub struct FakeDownloader {
    bodies: HashMap<String, Vec<u8>>,
    requests: Mutex<Vec<String>>,
}

impl FakeDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `url`.
    pub fn with(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.bodies.insert(url.to_string(), body.into());
        self
    }

    /// URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn body(&self, url: &str) -> Result<&[u8], DownloadError> {
        self.requests.lock().unwrap().push(url.to_string());
        self.bodies
            .get(url)
            .map(Vec::as_slice)
            .ok_or_else(|| DownloadError::Status {
                url: url.to_string(),
                status: 404,
            })
    }
}

#[async_trait]
impl Downloader for FakeDownloader {
    async fn download(&self, url: &str, dest: &Path) -> Result<(), DownloadError> {
        let body = self.body(url)?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| DownloadError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        tokio::fs::write(dest, body)
            .await
            .map_err(|source| DownloadError::Io {
                path: dest.to_path_buf(),
                source,
            })
    }

    async fn fetch_text(&self, url: &str) -> Result<String, DownloadError> {
        let body = self.body(url)?;
        Ok(String::from_utf8_lossy(body).into_owned())
    }
}

/// Records extraction requests and "extracts" by copying the archive into
/// the destination directory under its own file name.
#[derive(Debug, Default)]
pub struct FakeDecompressor {
    calls: Mutex<Vec<(PathBuf, PathBuf)>>,
}

impl FakeDecompressor {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(archive, destination)` pairs seen so far.
    pub fn calls(&self) -> Vec<(PathBuf, PathBuf)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Decompressor for FakeDecompressor {
    async fn extract(&self, archive: &Path, dest: &Path) -> Result<(), DecompressError> {
        self.calls
            .lock()
            .unwrap()
            .push((archive.to_path_buf(), dest.to_path_buf()));
        tokio::fs::create_dir_all(dest)
            .await
            .map_err(|source| io_error(dest, source))?;
        let name = archive.file_name().unwrap_or_default();
        tokio::fs::copy(archive, dest.join(name))
            .await
            .map_err(|source| io_error(archive, source))?;
        Ok(())
    }
}

fn io_error(path: &Path, source: std::io::Error) -> DecompressError {
    DecompressError::Io {
        path: path.to_path_buf(),
        source,
    }
}
