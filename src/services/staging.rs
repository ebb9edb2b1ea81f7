use std::io;
use std::path::{Path, PathBuf};

use tempfile::{Builder, TempPath};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

const COPY_BUFFER_SIZE: usize = 64 * 1024;

#[derive(Error, Debug)]
pub enum StagingError {
    #[error("File exceeds the maximum upload size of {limit} bytes")]
    SizeExceeded { limit: usize },

    #[error("Failed to stage file: {0}")]
    IoFailure(#[from] io::Error),
}

/// Writes incoming uploads to uniquely named files under a local directory.
pub struct StagingManager {
    dir: PathBuf,
    max_bytes: usize,
}

/// An upload persisted on local disk for the lifetime of one request.
///
/// The backing file is removed when this value is dropped, including on
/// early returns and when the request future is cancelled.
#[derive(Debug)]
pub struct StagedFile {
    path: TempPath,
    file_name: String,
    size: u64,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        tracing::debug!("Releasing staged file {}", self.path.display());
    }
}

impl StagingManager {
    pub fn new(dir: PathBuf, max_bytes: usize) -> Self {
        Self { dir, max_bytes }
    }

    /// Creates the staging directory if it does not exist yet.
    pub async fn prepare(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    /// Copies `reader` into a fresh file named `upload-<random>-<file_name>`.
    ///
    /// A reader error of kind [`io::ErrorKind::FileTooLarge`] is reported as
    /// [`StagingError::SizeExceeded`], which is how an exhausted request body
    /// limit surfaces here.
    pub async fn stage<R>(&self, mut reader: R, file_name: &str) -> Result<StagedFile, StagingError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let suffix = format!("-{}", file_name);
        let temp_file = Builder::new()
            .prefix("upload-")
            .suffix(&suffix)
            .tempfile_in(&self.dir)?;

        let handle = temp_file.reopen()?;
        // The TempPath owns removal from here on and must outlive the write handle.
        let path = temp_file.into_temp_path();
        let mut file = tokio::fs::File::from_std(handle);

        let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
        let mut total: u64 = 0;

        loop {
            let n = match reader.read(&mut buffer).await {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::FileTooLarge => {
                    return Err(StagingError::SizeExceeded {
                        limit: self.max_bytes,
                    });
                }
                Err(e) => return Err(e.into()),
            };
            if n == 0 {
                break;
            }

            total += n as u64;
            if total > self.max_bytes as u64 {
                return Err(StagingError::SizeExceeded {
                    limit: self.max_bytes,
                });
            }

            file.write_all(&buffer[..n]).await?;
        }

        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tracing::debug!(
            "Staged {} ({} bytes) at {}",
            file_name,
            total,
            path.display()
        );

        Ok(StagedFile {
            path,
            file_name: file_name.to_string(),
            size: total,
        })
    }
}
