use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{info, warn};

/// Creates per-job staging directories under one root.
///
/// Directories are keyed by the job's correlation identifier, so concurrent
/// jobs never share a workspace. Creation and teardown both belong to the
/// orchestrator that owns the job; no other component touches the directory.
pub struct WorkspaceManager {
    root: PathBuf,
}

#[derive(Debug, thiserror::Error)]
#[error("could not create workspace at '{path}': {source}")]
pub struct WorkspaceError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// The workspace survived every removal attempt. Logged and escalated, but
/// never allowed to overturn the job's primary outcome.
#[derive(Debug, thiserror::Error)]
#[error("workspace '{path}' still present after {attempts} removal attempts")]
pub struct CleanupError {
    pub path: PathBuf,
    pub attempts: u32,
}

impl WorkspaceManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the staging directory for one job.
    pub fn create(&self, job_id: &str) -> Result<Workspace, WorkspaceError> {
        let path = self.root.join(job_id);
        std::fs::create_dir_all(&path).map_err(|source| WorkspaceError {
            path: path.clone(),
            source,
        })?;
        Ok(Workspace { path })
    }
}

/// An exclusively owned local staging directory for one job.
pub struct Workspace {
    path: PathBuf,
}

impl Workspace {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where a staged file with the given name lives inside the workspace.
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    /// Best-effort recursive removal with bounded, linearly backed-off
    /// retries: the first attempt runs immediately, retry `n` waits `n`
    /// seconds first. Consumes the workspace; teardown happens once per job.
    ///
    /// Success means the directory no longer exists, whichever attempt got
    /// it there - including the directory already being gone.
    pub async fn teardown(self, max_attempts: u32) -> Result<(), CleanupError> {
        self.teardown_with(max_attempts, Duration::from_secs(1), |path| {
            std::fs::remove_dir_all(path)
        })
        .await
    }

    /// [`teardown`](Self::teardown) with an injectable backoff unit and
    /// removal primitive, so the attempt schedule is testable.
    pub async fn teardown_with<F>(
        self,
        max_attempts: u32,
        backoff_unit: Duration,
        mut remove: F,
    ) -> Result<(), CleanupError>
    where
        F: FnMut(&Path) -> io::Result<()>,
    {
        let max_attempts = max_attempts.max(1);
        for attempt in 1..=max_attempts {
            if attempt > 1 {
                tokio::time::sleep(backoff_unit * (attempt - 1)).await;
            }
            if !self.path.exists() {
                info!(path = %self.path.display(), "workspace already gone");
                return Ok(());
            }
            match remove(&self.path) {
                Ok(()) => {
                    info!(path = %self.path.display(), attempt, "workspace removed");
                    return Ok(());
                }
                Err(error) => {
                    warn!(
                        path = %self.path.display(),
                        attempt,
                        %error,
                        "workspace removal attempt failed"
                    );
                }
            }
        }

        if self.path.exists() {
            Err(CleanupError {
                path: self.path,
                attempts: max_attempts,
            })
        } else {
            Ok(())
        }
    }
}
