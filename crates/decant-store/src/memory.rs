use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;

use crate::auth::AccessMode;
use crate::client::{BlobStore, ByteStream, StoreProvider};
use crate::error::StoreError;
use crate::locator::BlobLocator;

/// In-memory store used by tests and local dry runs.
///
/// Records every operation it performs so tests can assert that a code path
/// touched the store (or, for validation failures, that it did not).
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<String, Bytes>>,
    operations: Mutex<Vec<String>>,
    fail_uploads: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn object_id(locator: &BlobLocator) -> String {
        format!("{}/{}", locator.container, locator.key)
    }

    fn record(&self, operation: String) {
        self.operations
            .lock()
            .expect("operation log lock")
            .push(operation);
    }

    /// Seed an object directly, bypassing the operation log.
    pub fn insert(&self, container: &str, key: &str, content: impl Into<Bytes>) {
        let id = Self::object_id(&BlobLocator::new(container, key));
        self.objects
            .lock()
            .expect("object map lock")
            .insert(id, content.into());
    }

    pub fn get(&self, container: &str, key: &str) -> Option<Bytes> {
        let id = Self::object_id(&BlobLocator::new(container, key));
        self.objects.lock().expect("object map lock").get(&id).cloned()
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().expect("object map lock").len()
    }

    /// Keys currently held in `container`, sorted for stable assertions.
    pub fn keys_in(&self, container: &str) -> Vec<String> {
        let prefix = format!("{container}/");
        let mut keys: Vec<String> = self
            .objects
            .lock()
            .expect("object map lock")
            .keys()
            .filter_map(|id| id.strip_prefix(&prefix).map(str::to_owned))
            .collect();
        keys.sort();
        keys
    }

    pub fn operations(&self) -> Vec<String> {
        self.operations.lock().expect("operation log lock").clone()
    }

    /// Make every subsequent upload fail with a store-side error.
    pub fn set_fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl BlobStore for MemoryStore {
    async fn exists(&self, locator: &BlobLocator) -> Result<bool, StoreError> {
        self.record(format!("exists {locator}"));
        let id = Self::object_id(locator);
        Ok(self.objects.lock().expect("object map lock").contains_key(&id))
    }

    async fn download_to(
        &self,
        locator: &BlobLocator,
        destination: &Path,
    ) -> Result<(), StoreError> {
        self.record(format!("download {locator}"));
        let id = Self::object_id(locator);
        let content = self
            .objects
            .lock()
            .expect("object map lock")
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::Status {
                status: 404,
                locator: locator.to_string(),
            })?;
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(destination, &content).await?;
        Ok(())
    }

    async fn upload_overwrite(
        &self,
        locator: &BlobLocator,
        mut content: ByteStream,
    ) -> Result<(), StoreError> {
        self.record(format!("upload {locator}"));
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StoreError::Status {
                status: 500,
                locator: locator.to_string(),
            });
        }
        let mut buffer = Vec::new();
        while let Some(chunk) = content.next().await {
            buffer.extend_from_slice(&chunk?);
        }
        let id = Self::object_id(locator);
        self.objects
            .lock()
            .expect("object map lock")
            .insert(id, Bytes::from(buffer));
        Ok(())
    }
}

/// Hands out the same shared [`MemoryStore`] for every access mode.
#[derive(Clone)]
pub struct MemoryProvider {
    store: Arc<MemoryStore>,
}

impl MemoryProvider {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

impl StoreProvider for MemoryProvider {
    fn connect(&self, _mode: &AccessMode) -> Result<Arc<dyn BlobStore>, StoreError> {
        Ok(self.store.clone())
    }
}

#[cfg(test)]
mod tests {
    use crate::client::byte_stream;

    use super::*;

    #[tokio::test]
    async fn exists_reflects_inserted_objects() {
        let store = MemoryStore::new();
        store.insert("c", "a.txt", &b"x"[..]);
        assert!(store.exists(&BlobLocator::new("c", "a.txt")).await.unwrap());
        assert!(!store.exists(&BlobLocator::new("c", "b.txt")).await.unwrap());
    }

    #[tokio::test]
    async fn upload_overwrites_existing_object() {
        let store = MemoryStore::new();
        let locator = BlobLocator::new("c", "a.txt");
        store
            .upload_overwrite(&locator, byte_stream(&b"old"[..]))
            .await
            .unwrap();
        store
            .upload_overwrite(&locator, byte_stream(&b"new"[..]))
            .await
            .unwrap();
        assert_eq!(store.get("c", "a.txt").unwrap(), Bytes::from_static(b"new"));
        assert_eq!(store.object_count(), 1);
    }

    #[tokio::test]
    async fn download_writes_local_file() {
        let store = MemoryStore::new();
        store.insert("c", "a.txt", &b"payload"[..]);
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("staging").join("a.txt");
        store
            .download_to(&BlobLocator::new("c", "a.txt"), &destination)
            .await
            .unwrap();
        assert_eq!(std::fs::read(&destination).unwrap(), b"payload");
    }

    #[tokio::test]
    async fn download_of_missing_object_is_not_found() {
        let store = MemoryStore::new();
        let dir = tempfile::tempdir().unwrap();
        let result = store
            .download_to(&BlobLocator::new("c", "nope"), &dir.path().join("nope"))
            .await;
        assert!(matches!(result, Err(StoreError::Status { status: 404, .. })));
    }

    #[tokio::test]
    async fn operations_are_logged() {
        let store = MemoryStore::new();
        store.insert("c", "a.txt", &b"x"[..]);
        let locator = BlobLocator::new("c", "a.txt");
        store.exists(&locator).await.unwrap();
        store
            .upload_overwrite(&BlobLocator::new("d", "b.txt"), byte_stream(&b"y"[..]))
            .await
            .unwrap();
        assert_eq!(store.operations(), vec!["exists c/a.txt", "upload d/b.txt"]);
    }

    #[tokio::test]
    async fn failed_chunk_aborts_upload_without_inserting() {
        let store = MemoryStore::new();
        let stream: ByteStream = Box::pin(futures_util::stream::iter([
            Ok(Bytes::from_static(b"partial")),
            Err(std::io::Error::new(std::io::ErrorKind::InvalidData, "bad chunk")),
        ]));
        let result = store
            .upload_overwrite(&BlobLocator::new("c", "a.txt"), stream)
            .await;
        assert!(matches!(result, Err(StoreError::Io(_))));
        assert_eq!(store.object_count(), 0);
    }

    #[tokio::test]
    async fn failing_uploads_return_store_error() {
        let store = MemoryStore::new();
        store.set_fail_uploads(true);
        let result = store
            .upload_overwrite(&BlobLocator::new("c", "a.txt"), byte_stream(&b"x"[..]))
            .await;
        assert!(matches!(result, Err(StoreError::Status { status: 500, .. })));
        assert_eq!(store.object_count(), 0);
    }
}
