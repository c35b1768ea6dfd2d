use decant_store::StoreError;

use crate::workspace::WorkspaceError;

/// Unrecoverable failures inside one extraction job.
///
/// All of these surface upward as the single internal-failure outcome; the
/// variants exist so logs and tests can tell the stages apart.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("could not construct store client: {0}")]
    Connect(#[source] StoreError),

    #[error("could not check source object: {0}")]
    SourceCheck(#[source] StoreError),

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    #[error("could not download source archive: {0}")]
    Download(#[source] StoreError),

    #[error("source object is not a readable archive: {0}")]
    ExtractionOpen(#[source] decant_archive::Error),

    #[error("archive entry could not be read: {0}")]
    ExtractionEntry(#[source] decant_archive::Error),

    #[error("could not upload entry '{key}': {source}")]
    Upload {
        key: String,
        #[source]
        source: StoreError,
    },
}
