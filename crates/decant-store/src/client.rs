use std::io;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;

use crate::auth::AccessMode;
use crate::error::StoreError;
use crate::locator::BlobLocator;

/// Chunked object content on its way into the store.
pub type ByteStream = BoxStream<'static, io::Result<Bytes>>;

/// A single-chunk [`ByteStream`] over content already in memory.
pub fn byte_stream(content: impl Into<Bytes>) -> ByteStream {
    Box::pin(futures_util::stream::iter([Ok(content.into())]))
}

/// The three store operations the extraction pipeline depends on.
///
/// Anything else a real blob store offers (listing, metadata, leases) is
/// intentionally absent from this seam.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Whether an object exists at the locator.
    async fn exists(&self, locator: &BlobLocator) -> Result<bool, StoreError>;

    /// Stream the object's bytes into a local file, creating parent
    /// directories as needed.
    async fn download_to(&self, locator: &BlobLocator, destination: &Path)
    -> Result<(), StoreError>;

    /// Upload the stream's chunks under the locator, unconditionally
    /// replacing any object already there. Single attempt, no internal
    /// retry; an `Err` chunk aborts the upload.
    async fn upload_overwrite(
        &self,
        locator: &BlobLocator,
        content: ByteStream,
    ) -> Result<(), StoreError>;
}

/// Produces an authenticated store client for a given access mode.
///
/// Selected once per job from validated input; the pipeline treats the
/// result as an opaque capability.
pub trait StoreProvider: Send + Sync {
    fn connect(&self, mode: &AccessMode) -> Result<Arc<dyn BlobStore>, StoreError>;
}
