use crate::error::{NotifierError, Result};
use crate::models::ObjectMetadata;
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use std::time::Duration;

pub const META_ORIGINAL_NAME: &str = "original_name";
pub const META_ACTIVITY_ID: &str = "activity_id";
pub const META_EXTERNAL_ID: &str = "external_id";

#[async_trait]
pub trait StorageService: Send + Sync {
    /// Reads the `x-amz-meta-*` fields recorded on the object at upload time.
    async fn get_object_metadata(&self, bucket: &str, key: &str) -> Result<ObjectMetadata>;

    /// Issues a signed, read-only `GetObject` URL valid for `expires_in`.
    async fn generate_presigned_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String>;
}

pub struct S3StorageService {
    client: Client,
}

impl S3StorageService {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StorageService for S3StorageService {
    async fn get_object_metadata(&self, bucket: &str, key: &str) -> Result<ObjectMetadata> {
        let res = self
            .client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                NotifierError::Metadata(format!(
                    "head_object {}/{} failed: {}",
                    bucket,
                    key,
                    DisplayErrorContext(&e)
                ))
            })?;

        // The SDK strips the `x-amz-meta-` prefix from user metadata keys.
        let metadata = res.metadata().ok_or_else(|| {
            NotifierError::Metadata(format!("{}/{} carries no user metadata", bucket, key))
        })?;
        let field = |name: &str| {
            metadata.get(name).cloned().ok_or_else(|| {
                NotifierError::Metadata(format!("{}/{} is missing x-amz-meta-{}", bucket, key, name))
            })
        };

        Ok(ObjectMetadata {
            original_name: field(META_ORIGINAL_NAME)?,
            activity_id: field(META_ACTIVITY_ID)?,
            external_id: field(META_EXTERNAL_ID)?,
        })
    }

    async fn generate_presigned_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String> {
        let presigning = PresigningConfig::expires_in(expires_in)
            .map_err(|e| NotifierError::Link(format!("invalid expiry {:?}: {}", expires_in, e)))?;

        let request = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| {
                tracing::error!("Failed to presign {}/{}: {}", bucket, key, DisplayErrorContext(&e));
                NotifierError::Link(format!("{}/{}: {}", bucket, key, DisplayErrorContext(&e)))
            })?;

        Ok(request.uri().to_string())
    }
}
