/// S3 blob storage for post and profile images
use super::BlobStore;
use crate::config::StorageConfig;
use crate::error::{ServiceError, ServiceResult};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct S3BlobStore {
    client: Arc<Client>,
    config: StorageConfig,
}

impl S3BlobStore {
    /// Build a client from the ambient AWS environment (credentials chain)
    pub async fn connect(config: StorageConfig) -> Self {
        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;
        let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
            .force_path_style(config.path_style)
            .build();

        Self::new(Arc::new(Client::from_conf(s3_config)), config)
    }

    pub fn new(client: Arc<Client>, config: StorageConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }
}

fn storage_error(context: &str, err: impl std::fmt::Display) -> ServiceError {
    ServiceError::Storage(format!("{}: {}", context, err))
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn upload(&self, key: &str, body: Vec<u8>, content_type: &str) -> ServiceResult<()> {
        debug!(key, bytes = body.len(), content_type, "Uploading object");
        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| storage_error("put_object failed", e))?;

        Ok(())
    }

    async fn download_url(&self, key: &str) -> ServiceResult<String> {
        self.client
            .head_object()
            .bucket(&self.config.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| ServiceError::NotFound(format!("object {}: {}", key, e)))?;

        Ok(self.config.object_url(key))
    }

    async fn delete_by_url(&self, url: &str) -> ServiceResult<()> {
        let key = self.config.key_from_url(url);
        self.client
            .delete_object()
            .bucket(&self.config.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| storage_error("delete_object failed", e))?;

        Ok(())
    }

    async fn ping(&self) -> ServiceResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.config.bucket)
            .send()
            .await
            .map_err(|e| storage_error("head_bucket failed", e))?;

        Ok(())
    }
}
