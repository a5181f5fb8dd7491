//! Zip extraction for the `decompress` directive.

use std::fs::File;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use pack_script::{DecompressError, Decompressor};

/// [`Decompressor`] for zip archives.
///
/// Entries whose names would land outside the destination are skipped by
/// the `zip` crate's path sanitising.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipDecompressor;

#[async_trait]
impl Decompressor for ZipDecompressor {
    async fn extract(&self, archive: &Path, dest: &Path) -> Result<(), DecompressError> {
        let archive = archive.to_path_buf();
        let dest = dest.to_path_buf();
        let path = archive.clone();
        tokio::task::spawn_blocking(move || extract_zip(&archive, &dest))
            .await
            .map_err(|e| DecompressError::Archive {
                path,
                message: e.to_string(),
            })?
    }
}

fn extract_zip(archive: &Path, dest: &Path) -> Result<(), DecompressError> {
    let file = File::open(archive).map_err(|source| io_error(archive, source))?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| archive_error(archive, e))?;
    std::fs::create_dir_all(dest).map_err(|source| io_error(dest, source))?;
    zip.extract(dest).map_err(|e| archive_error(archive, e))?;
    tracing::debug!(
        archive = %archive.display(),
        entries = zip.len(),
        dest = %dest.display(),
        "extracted archive"
    );
    Ok(())
}

fn archive_error(path: &Path, error: zip::result::ZipError) -> DecompressError {
    DecompressError::Archive {
        path: path.to_path_buf(),
        message: error.to_string(),
    }
}

fn io_error(path: &Path, source: std::io::Error) -> DecompressError {
    DecompressError::Io {
        path: PathBuf::from(path),
        source,
    }
}
