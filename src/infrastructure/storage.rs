use crate::config::S3Config;
use crate::services::backend::StoreConnector;
use crate::services::storage::{ObjectStore, S3ObjectStore};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use std::sync::Arc;
use tracing::info;

/// Builds the S3 client from [`S3Config`] on first use.
pub struct S3Connector {
    config: S3Config,
}

impl S3Connector {
    pub fn new(config: S3Config) -> Self {
        Self { config }
    }
}

#[async_trait]
impl StoreConnector for S3Connector {
    async fn connect(&self) -> Result<Arc<dyn ObjectStore>> {
        let bucket = self
            .config
            .bucket
            .clone()
            .context("S3_BUCKET is not set")?;

        info!(
            "☁️  S3 Storage: {} (Bucket: {})",
            self.config.endpoint.as_deref().unwrap_or("aws"),
            bucket
        );

        let mut loader = aws_config::from_env().region(Region::new(self.config.region.clone()));

        if let Some(endpoint) = &self.config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        match (&self.config.access_key, &self.config.secret_key) {
            (Some(access_key), Some(secret_key)) => {
                loader = loader.credentials_provider(Credentials::new(
                    access_key.clone(),
                    secret_key.clone(),
                    None,
                    None,
                    "static",
                ));
            }
            (None, None) => {
                if let Some(profile) = &self.config.profile {
                    loader = loader.profile_name(profile);
                }
            }
            _ => {
                return Err(anyhow!(
                    "S3_ACCESS_KEY and S3_SECRET_KEY must be set together"
                ));
            }
        }

        let aws_config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
            .force_path_style(self.config.force_path_style)
            .build();

        let client = aws_sdk_s3::Client::from_conf(s3_config);

        // Ensure bucket exists
        match client.head_bucket().bucket(&bucket).send().await {
            Ok(_) => info!("✅ Bucket '{}' is ready", bucket),
            Err(_) => {
                info!("🪣 Bucket '{}' not found, creating...", bucket);
                client
                    .create_bucket()
                    .bucket(&bucket)
                    .send()
                    .await
                    .map_err(|e| {
                        anyhow!(
                            "bucket '{}' is unavailable: {}",
                            bucket,
                            DisplayErrorContext(&e)
                        )
                    })?;
                info!("✅ Bucket '{}' created successfully", bucket);
            }
        }

        Ok(Arc::new(S3ObjectStore::new(client, bucket)))
    }
}
