use std::io::{self, Read};

use bytes::Bytes;
use decant_store::{BlobLocator, BlobStore, ByteStream, StoreError};
use tokio::sync::mpsc;
use tracing::debug;

/// Entry content is forwarded to the store in chunks of this size.
const CHUNK_SIZE: usize = 64 * 1024;

/// Why one entry failed to publish. The two sides are kept apart so the
/// orchestrator can classify a failure as extraction-side or store-side.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("could not read entry content: {0}")]
    Read(#[source] io::Error),

    #[error("could not upload entry content: {0}")]
    Upload(#[source] StoreError),
}

/// Stream one entry's content to the store under `locator`, overwriting
/// whatever is there. Single attempt.
///
/// Content flows through a small bounded channel into the upload body, so
/// only a few chunks are in memory at once regardless of entry size. The
/// source stream is consumed and released by the time this returns, on every
/// exit path, so the archive reader can move on to the next entry whatever
/// happens here.
pub async fn publish_entry<R: Read>(
    store: &dyn BlobStore,
    locator: &BlobLocator,
    mut content: R,
) -> Result<u64, PublishError> {
    let (tx, mut rx) = mpsc::channel::<io::Result<Bytes>>(2);
    let body: ByteStream = Box::pin(futures_util::stream::poll_fn(move |cx| rx.poll_recv(cx)));
    let upload = store.upload_overwrite(locator, body);

    let mut drained = 0u64;
    let mut read_failure = None;
    let feed = async {
        loop {
            let mut chunk = vec![0u8; CHUNK_SIZE];
            match content.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => {
                    chunk.truncate(n);
                    drained += n as u64;
                    if tx.send(Ok(Bytes::from(chunk))).await.is_err() {
                        // Upload side is gone; its error surfaces below.
                        break;
                    }
                }
                Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                Err(error) => {
                    let abort = io::Error::new(error.kind(), "entry stream failed");
                    let _ = tx.send(Err(abort)).await;
                    read_failure = Some(error);
                    break;
                }
            }
        }
        drop(content);
        drop(tx);
    };

    let ((), uploaded) = futures_util::join!(feed, upload);

    // A broken read is reported as such even though it also aborted the
    // upload.
    if let Some(error) = read_failure {
        return Err(PublishError::Read(error));
    }
    uploaded.map_err(PublishError::Upload)?;
    debug!(%locator, bytes = drained, "published entry");
    Ok(drained)
}

#[cfg(test)]
mod tests {
    use decant_store::MemoryStore;

    use super::*;

    struct BrokenReader;

    impl Read for BrokenReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::InvalidData, "bad deflate"))
        }
    }

    #[tokio::test]
    async fn uploads_full_content_under_locator() {
        let store = MemoryStore::new();
        let locator = BlobLocator::new("published", "data.csv");
        let written = publish_entry(&store, &locator, &b"a,b\n1,2\n"[..])
            .await
            .unwrap();
        assert_eq!(written, 8);
        assert_eq!(
            store.get("published", "data.csv").unwrap(),
            Bytes::from_static(b"a,b\n1,2\n")
        );
    }

    #[tokio::test]
    async fn large_entry_streams_through_without_truncation() {
        let store = MemoryStore::new();
        let locator = BlobLocator::new("published", "big.bin");
        // Spans several chunks plus a partial tail.
        let content = vec![0xAB; 3 * CHUNK_SIZE + 17];
        let written = publish_entry(&store, &locator, &content[..]).await.unwrap();
        assert_eq!(written as usize, content.len());
        assert_eq!(
            store.get("published", "big.bin").unwrap(),
            Bytes::from(content)
        );
    }

    #[tokio::test]
    async fn overwrites_existing_object() {
        let store = MemoryStore::new();
        store.insert("published", "data.csv", &b"old"[..]);
        let locator = BlobLocator::new("published", "data.csv");
        publish_entry(&store, &locator, &b"new"[..]).await.unwrap();
        assert_eq!(
            store.get("published", "data.csv").unwrap(),
            Bytes::from_static(b"new")
        );
    }

    #[tokio::test]
    async fn read_failure_is_distinct_from_upload_failure() {
        let store = MemoryStore::new();
        let locator = BlobLocator::new("published", "data.csv");

        let read_err = publish_entry(&store, &locator, BrokenReader).await.unwrap_err();
        assert!(matches!(read_err, PublishError::Read(_)));
        // Nothing reached the store.
        assert_eq!(store.object_count(), 0);

        store.set_fail_uploads(true);
        let upload_err = publish_entry(&store, &locator, &b"x"[..]).await.unwrap_err();
        assert!(matches!(upload_err, PublishError::Upload(_)));
    }
}
