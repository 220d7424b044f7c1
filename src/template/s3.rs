//! S3-backed implementation of [`BlobStore`].

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::Client;
use tracing::debug;

use crate::error::{Result, TemplateError};

use super::store::{BlobStore, BucketPage};

/// S3 blob store for template uploads.
#[derive(Debug, Clone)]
pub struct S3BlobStore {
    /// Underlying SDK client.
    client: Client,
}

impl S3BlobStore {
    /// Creates a store from a loaded AWS configuration.
    #[must_use]
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn list_buckets_page(
        &self,
        prefix: &str,
        region: &str,
        continuation: Option<String>,
    ) -> Result<BucketPage> {
        let out = self
            .client
            .list_buckets()
            .prefix(prefix)
            .bucket_region(region)
            .set_continuation_token(continuation)
            .send()
            .await
            .map_err(|e| {
                TemplateError::upload(format!(
                    "listing buckets: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        Ok(BucketPage {
            names: out
                .buckets()
                .iter()
                .filter_map(|b| b.name().map(String::from))
                .collect(),
            continuation: out.continuation_token().map(String::from),
        })
    }

    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()> {
        debug!("Uploading template to s3://{bucket}/{key}");

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body.into())
            .send()
            .await
            .map_err(|e| TemplateError::upload(DisplayErrorContext(&e).to_string()))?;

        Ok(())
    }
}
