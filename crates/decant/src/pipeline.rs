use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use decant_archive::{ArchiveReader, sanitize_key};
use decant_store::{BlobLocator, BlobStore, StoreProvider};
use tracing::{debug, error, info};

use crate::config::Settings;
use crate::error::PipelineError;
use crate::job::{ArchiveJob, JobRequest, Outcome};
use crate::publish::{PublishError, publish_entry};
use crate::source;
use crate::workspace::{Workspace, WorkspaceManager};

/// Orchestrates one extraction job end to end:
/// validate -> resolve -> extract -> publish each entry -> clean up.
///
/// Jobs are independent of each other; within a job every stage waits for
/// the previous one. Once extraction has started, workspace cleanup is
/// always attempted, and a cleanup failure never overturns the outcome the
/// publish stage already determined.
pub struct Pipeline<P> {
    settings: Settings,
    workspaces: WorkspaceManager,
    provider: P,
    cleanup_backoff: Duration,
    cleanup_remove: RemoveFn,
}

type RemoveFn = Arc<dyn Fn(&Path) -> io::Result<()> + Send + Sync>;

impl<P: StoreProvider> Pipeline<P> {
    pub fn new(settings: Settings, provider: P) -> Self {
        let root = settings
            .workspace_root
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("decant"));
        Self {
            workspaces: WorkspaceManager::new(root),
            settings,
            provider,
            cleanup_backoff: Duration::from_secs(1),
            cleanup_remove: Arc::new(|path| std::fs::remove_dir_all(path)),
        }
    }

    /// Replace the cleanup backoff unit and removal primitive, so the
    /// cleanup branch can be exercised without waiting out the real
    /// schedule or holding a directory open.
    pub fn with_cleanup(
        mut self,
        backoff_unit: Duration,
        remove: impl Fn(&Path) -> io::Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.cleanup_backoff = backoff_unit;
        self.cleanup_remove = Arc::new(remove);
        self
    }

    /// Run one job to completion. Every failure mode maps onto one of the
    /// four user-visible outcomes; this function does not panic or return
    /// early without an outcome.
    pub async fn run(&self, request: JobRequest) -> Outcome {
        // Validating: no side effects before this passes.
        let job = match ArchiveJob::from_request(request, &self.settings) {
            Ok(job) => job,
            Err(err) => {
                error!(%err, "request validation failed");
                return Outcome::MissingInput(err);
            }
        };
        info!(job_id = %job.id, source = %job.source, access = ?job.access, "job accepted");

        let store = match self.provider.connect(&job.access) {
            Ok(store) => store,
            Err(err) => {
                error!(%err, "store client construction failed");
                return Outcome::Failed(PipelineError::Connect(err));
            }
        };

        // Resolving: the source must exist before any workspace is created.
        match store.exists(&job.source).await {
            Ok(true) => {}
            Ok(false) => {
                error!(source = %job.source, "source object does not exist");
                return Outcome::SourceNotFound;
            }
            Err(err) => {
                error!(%err, "existence check failed");
                return Outcome::Failed(PipelineError::SourceCheck(err));
            }
        }

        let workspace = match self.workspaces.create(&job.id) {
            Ok(workspace) => workspace,
            Err(err) => {
                error!(%err, "workspace creation failed");
                return Outcome::Failed(err.into());
            }
        };

        let result = self
            .extract_and_publish(store.as_ref(), &job, &workspace)
            .await;

        // Cleaning up: always, now that a workspace exists. A failure here
        // is escalated through the log, not through the outcome.
        if let Err(err) = workspace
            .teardown_with(self.settings.cleanup_attempts, self.cleanup_backoff, |path| {
                (self.cleanup_remove)(path)
            })
            .await
        {
            error!(job_id = %job.id, %err, "workspace cleanup failed; manual removal required");
        }

        match result {
            Ok(published) => {
                info!(job_id = %job.id, published, "job complete");
                Outcome::Done { published }
            }
            Err(err) => {
                error!(job_id = %job.id, %err, "job failed");
                Outcome::Failed(err)
            }
        }
    }

    /// Extracting and Publishing: stage the archive, then walk its entries
    /// once, in order. The first unrecoverable error aborts the remaining
    /// entries.
    async fn extract_and_publish(
        &self,
        store: &dyn BlobStore,
        job: &ArchiveJob,
        workspace: &Workspace,
    ) -> Result<usize, PipelineError> {
        let staged = source::stage_archive(store, &job.source, workspace)
            .await
            .map_err(PipelineError::Download)?;

        let mut reader = ArchiveReader::open(&staged).map_err(PipelineError::ExtractionOpen)?;
        info!(entries = reader.len(), "archive opened");

        let mut published = 0usize;
        while let Some(entry) = reader
            .next_entry()
            .map_err(PipelineError::ExtractionEntry)?
        {
            if entry.is_dir() {
                debug!(name = entry.name(), "skipping directory entry");
                continue;
            }

            let key = sanitize_key(entry.name());
            let locator = BlobLocator::new(job.target_container.as_str(), key.as_str());
            info!(raw = entry.name(), %locator, "publishing entry");
            publish_entry(store, &locator, entry.into_content())
                .await
                .map_err(|err| match err {
                    PublishError::Read(io) => {
                        PipelineError::ExtractionEntry(decant_archive::Error::from(io))
                    }
                    PublishError::Upload(store_err) => PipelineError::Upload {
                        key,
                        source: store_err,
                    },
                })?;
            published += 1;
        }

        Ok(published)
    }
}
