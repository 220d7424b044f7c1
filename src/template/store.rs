//! Blob storage trait definition.
//!
//! This module defines the interface the payload resolver uses for bucket
//! discovery and template upload.

use async_trait::async_trait;

use crate::error::Result;

/// One page of a bucket listing.
#[derive(Debug, Clone)]
pub struct BucketPage {
    /// Bucket names on this page.
    pub names: Vec<String>,
    /// Continuation token for the next page, when more pages exist.
    pub continuation: Option<String>,
}

/// Trait for the blob-storage backend holding oversized templates.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Lists one page of bucket names matching a prefix in a region.
    async fn list_buckets_page(
        &self,
        prefix: &str,
        region: &str,
        continuation: Option<String>,
    ) -> Result<BucketPage>;

    /// Uploads an object.
    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()>;
}
