//! Template payload handling.
//!
//! This module owns the inline-vs-upload decision for template bodies,
//! backed by a blob-storage trait with an S3 implementation.

mod resolver;
mod s3;
mod store;

pub use resolver::{PayloadResolver, TemplateSource, INLINE_TEMPLATE_LIMIT};
pub use s3::S3BlobStore;
pub use store::{BlobStore, BucketPage};

#[cfg(test)]
pub use store::MockBlobStore;
