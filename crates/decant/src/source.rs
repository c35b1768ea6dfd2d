use std::path::PathBuf;

use decant_store::{BlobLocator, BlobStore, StoreError};
use tracing::info;

use crate::workspace::Workspace;

/// Materialize the remote archive object into the job's workspace as a
/// plain file, preserving the object's logical name.
///
/// Existence is the orchestrator's concern and is checked before any
/// workspace exists; by the time this runs the object is expected to be
/// there, and any transfer failure is unrecoverable for the job.
pub async fn stage_archive(
    store: &dyn BlobStore,
    locator: &BlobLocator,
    workspace: &Workspace,
) -> Result<PathBuf, StoreError> {
    let staged = workspace.file_path(locator.blob_name());
    info!(%locator, staged = %staged.display(), "downloading source archive");
    store.download_to(locator, &staged).await?;
    Ok(staged)
}

#[cfg(test)]
mod tests {
    use decant_store::MemoryStore;

    use super::*;
    use crate::workspace::WorkspaceManager;

    #[tokio::test]
    async fn stages_object_under_its_blob_name() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = WorkspaceManager::new(dir.path()).create("job-1").unwrap();
        let store = MemoryStore::new();
        store.insert("incoming", "nested/archive.zip", &b"archive-bytes"[..]);

        let staged = stage_archive(
            &store,
            &BlobLocator::new("incoming", "nested/archive.zip"),
            &workspace,
        )
        .await
        .unwrap();

        assert_eq!(staged, workspace.file_path("archive.zip"));
        assert_eq!(std::fs::read(&staged).unwrap(), b"archive-bytes");
    }

    #[tokio::test]
    async fn missing_object_surfaces_store_error() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = WorkspaceManager::new(dir.path()).create("job-2").unwrap();
        let store = MemoryStore::new();

        let result = stage_archive(
            &store,
            &BlobLocator::new("incoming", "absent.zip"),
            &workspace,
        )
        .await;
        assert!(matches!(result, Err(StoreError::Status { status: 404, .. })));
    }
}
