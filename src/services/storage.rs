use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use std::path::Path;

/// Remote object storage the gateway forwards uploads to.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores the file at `local_path` as `file_name` under `directory` and
    /// returns a reference to the stored object.
    async fn upload_file(
        &self,
        local_path: &Path,
        file_name: &str,
        directory: &str,
        overwrite: bool,
    ) -> Result<String>;

    /// Removes the object named `object_name`. Missing objects are an error.
    async fn delete_file(&self, object_name: &str) -> Result<()>;
}

/// Joins a destination directory and file name into an object key.
/// The root directory maps to a bare file name.
pub fn object_key(directory: &str, file_name: &str) -> String {
    let directory = directory.trim_matches('/');
    if directory.is_empty() {
        file_name.to_string()
    } else {
        format!("{}/{}", directory, file_name)
    }
}

pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    pub fn new(client: Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    async fn file_exists(&self, key: &str) -> Result<bool> {
        let res = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match res {
            Ok(_) => Ok(true),
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_not_found() {
                    Ok(false)
                } else {
                    Err(anyhow!("{}", DisplayErrorContext(&service_error)))
                }
            }
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn upload_file(
        &self,
        local_path: &Path,
        file_name: &str,
        directory: &str,
        overwrite: bool,
    ) -> Result<String> {
        let key = object_key(directory, file_name);

        if !overwrite && self.file_exists(&key).await? {
            bail!("object '{}' already exists", key);
        }

        let body = ByteStream::from_path(local_path)
            .await
            .map_err(|e| anyhow!("failed to read {}: {}", local_path.display(), e))?;

        let output = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(body)
            .send()
            .await
            .map_err(|e| anyhow!("{}", DisplayErrorContext(&e)))?;

        tracing::debug!(
            "Stored s3://{}/{} (etag: {})",
            self.bucket,
            key,
            output.e_tag().unwrap_or("-")
        );

        Ok(format!("s3://{}/{}", self.bucket, key))
    }

    async fn delete_file(&self, object_name: &str) -> Result<()> {
        let key = object_name.trim_start_matches('/');

        if !self.file_exists(key).await? {
            bail!("object '{}' does not exist", key);
        }

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| anyhow!("{}", DisplayErrorContext(&e)))?;
        Ok(())
    }
}
