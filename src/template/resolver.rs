//! Template payload resolution.
//!
//! CloudFormation accepts template bodies inline only up to a size limit;
//! anything larger must be uploaded to S3 and referenced by URL. This
//! module decides which form to use and owns bucket discovery and upload.

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::arn;
use crate::error::{Result, TemplateError};

use super::store::BlobStore;

/// Largest template body the service accepts inline, in bytes.
pub const INLINE_TEMPLATE_LIMIT: usize = 51_200;

/// Provider-assigned prefix of the template buckets the console creates.
const TEMPLATE_BUCKET_PREFIX: &str = "cf-templates-";

/// A resolved template payload.
///
/// The two forms are mutually exclusive: a change-set creation request
/// carries either an inline body or a reference URL, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// Body sent inline with the request.
    Inline(String),
    /// Body uploaded to S3 and referenced by URL.
    Url(String),
}

impl TemplateSource {
    /// Returns true for the inline form.
    #[must_use]
    pub const fn is_inline(&self) -> bool {
        matches!(self, Self::Inline(_))
    }
}

/// Resolves a template body to the payload form the service accepts.
#[derive(Debug)]
pub struct PayloadResolver<S> {
    /// Blob store used for oversized templates.
    store: S,
    /// Inline size threshold in bytes.
    limit: usize,
}

impl<S: BlobStore> PayloadResolver<S> {
    /// Creates a resolver with the service's inline size limit.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self {
            store,
            limit: INLINE_TEMPLATE_LIMIT,
        }
    }

    /// Creates a resolver with a custom inline size threshold.
    #[must_use]
    pub const fn with_limit(store: S, limit: usize) -> Self {
        Self { store, limit }
    }

    /// Resolves a template body for the given stack.
    ///
    /// Bodies at or under the threshold are returned unchanged, inline.
    /// Larger bodies are uploaded to the region's template bucket under a
    /// content-addressed key and returned as a reference URL.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::BucketDiscoveryFailed`] if no template
    /// bucket exists for the stack's region, [`TemplateError::UploadFailed`]
    /// on a transport failure, or an input error if the stack ARN is
    /// malformed. Uploads are not retried; the change set does not exist
    /// yet, so there is no partial state to resume from.
    pub async fn resolve(
        &self,
        stack_name: &str,
        stack_id: &str,
        body: &str,
    ) -> Result<TemplateSource> {
        if body.len() <= self.limit {
            return Ok(TemplateSource::Inline(body.to_string()));
        }

        info!(
            "Template is {} bytes, over the {} byte inline limit; uploading to S3",
            body.len(),
            self.limit
        );

        let region = arn::region_of(stack_id)?;
        let bucket = self.discover_bucket(region).await?;

        let key = format!(
            "{stack_name}/{}",
            hex::encode(Sha256::digest(body.as_bytes()))
        );
        self.store
            .put_object(&bucket, &key, body.as_bytes().to_vec())
            .await?;

        Ok(TemplateSource::Url(format!(
            "https://s3.{region}.amazonaws.com/{bucket}/{key}"
        )))
    }

    /// Finds the region's template bucket: first listed bucket whose name
    /// ends with `-{region}`. Pagination stops at the first match.
    async fn discover_bucket(&self, region: &str) -> Result<String> {
        let suffix = format!("-{region}");
        let mut continuation = None;

        loop {
            let page = self
                .store
                .list_buckets_page(TEMPLATE_BUCKET_PREFIX, region, continuation)
                .await?;

            if let Some(name) = page.names.iter().find(|n| n.ends_with(&suffix)) {
                debug!("Using template bucket: {name}");
                return Ok(name.clone());
            }

            continuation = page.continuation;
            if continuation.is_none() {
                return Err(TemplateError::BucketDiscoveryFailed {
                    region: region.to_string(),
                }
                .into());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::store::{BucketPage, MockBlobStore};
    use super::*;
    use crate::error::StackPilotError;
    use mockall::predicate::eq;

    const STACK_ARN: &str = "arn:aws:cloudformation:eu-west-1:123456789012:stack/orders-svc/abc";

    fn page(names: &[&str], continuation: Option<&str>) -> BucketPage {
        BucketPage {
            names: names.iter().map(|n| (*n).to_string()).collect(),
            continuation: continuation.map(String::from),
        }
    }

    #[tokio::test]
    async fn test_small_body_stays_inline() {
        // No expectations: any store call would panic the test.
        let resolver = PayloadResolver::new(MockBlobStore::new());
        let body = "a".repeat(INLINE_TEMPLATE_LIMIT);

        let source = resolver.resolve("orders-svc", STACK_ARN, &body).await.unwrap();

        assert_eq!(source, TemplateSource::Inline(body));
    }

    #[tokio::test]
    async fn test_large_body_is_uploaded_and_referenced() {
        let body = "a".repeat(60_000);
        let expected_key = format!(
            "orders-svc/{}",
            hex::encode(Sha256::digest(body.as_bytes()))
        );

        let mut store = MockBlobStore::new();
        store
            .expect_list_buckets_page()
            .with(eq("cf-templates-"), eq("eu-west-1"), eq(None::<String>))
            .times(1)
            .returning(|_, _, _| {
                Ok(page(
                    &["cf-templates-1abc-us-east-1", "cf-templates-1abc-eu-west-1"],
                    None,
                ))
            });
        store
            .expect_put_object()
            .withf(move |bucket, key, body_bytes| {
                bucket == "cf-templates-1abc-eu-west-1"
                    && key == expected_key
                    && body_bytes.len() == 60_000
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let resolver = PayloadResolver::new(store);
        let source = resolver.resolve("orders-svc", STACK_ARN, &body).await.unwrap();

        assert!(!source.is_inline());
        let TemplateSource::Url(url) = source else {
            panic!("expected a reference URL");
        };
        assert!(url.starts_with("https://s3.eu-west-1.amazonaws.com/cf-templates-1abc-eu-west-1/orders-svc/"));
    }

    #[tokio::test]
    async fn test_discovery_stops_at_first_matching_page() {
        let mut store = MockBlobStore::new();
        store
            .expect_list_buckets_page()
            .with(eq("cf-templates-"), eq("eu-west-1"), eq(None::<String>))
            .times(1)
            .returning(|_, _, _| Ok(page(&["cf-templates-1abc-us-east-1"], Some("next"))));
        store
            .expect_list_buckets_page()
            .with(
                eq("cf-templates-"),
                eq("eu-west-1"),
                eq(Some(String::from("next"))),
            )
            .times(1)
            .returning(|_, _, _| {
                Ok(page(
                    &["cf-templates-1abc-eu-west-1"],
                    Some("unvisited"),
                ))
            });
        store.expect_put_object().returning(|_, _, _| Ok(()));

        let resolver = PayloadResolver::new(store);
        let body = "a".repeat(60_000);
        resolver.resolve("orders-svc", STACK_ARN, &body).await.unwrap();
    }

    #[tokio::test]
    async fn test_no_matching_bucket_fails_discovery() {
        let mut store = MockBlobStore::new();
        store
            .expect_list_buckets_page()
            .times(1)
            .returning(|_, _, _| Ok(page(&["cf-templates-1abc-us-east-1"], None)));
        // put_object must never be called.

        let resolver = PayloadResolver::new(store);
        let body = "a".repeat(60_000);
        let err = resolver.resolve("orders-svc", STACK_ARN, &body).await.unwrap_err();

        assert!(matches!(
            err,
            StackPilotError::Template(TemplateError::BucketDiscoveryFailed { ref region })
                if region == "eu-west-1"
        ));
    }

    #[tokio::test]
    async fn test_upload_failure_propagates() {
        let mut store = MockBlobStore::new();
        store
            .expect_list_buckets_page()
            .returning(|_, _, _| Ok(page(&["cf-templates-1abc-eu-west-1"], None)));
        store
            .expect_put_object()
            .returning(|_, _, _| Err(TemplateError::upload("connection reset").into()));

        let resolver = PayloadResolver::new(store);
        let body = "a".repeat(60_000);
        let err = resolver.resolve("orders-svc", STACK_ARN, &body).await.unwrap_err();

        assert!(matches!(
            err,
            StackPilotError::Template(TemplateError::UploadFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_custom_threshold_never_inlines_above_it() {
        let mut store = MockBlobStore::new();
        store
            .expect_list_buckets_page()
            .returning(|_, _, _| Ok(page(&["cf-templates-1abc-eu-west-1"], None)));
        store.expect_put_object().returning(|_, _, _| Ok(()));

        let resolver = PayloadResolver::with_limit(store, 8);
        let source = resolver.resolve("orders-svc", STACK_ARN, "123456789").await.unwrap();

        assert!(!source.is_inline());
    }
}
