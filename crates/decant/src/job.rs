use decant_store::{AccessMode, BlobLocator};
use serde::Deserialize;
use uuid::Uuid;

use crate::config::Settings;
use crate::error::PipelineError;

fn default_true() -> bool {
    true
}

/// Request payload as received from the boundary adapter.
///
/// Container fields are optional; configuration supplies fallbacks.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub container_source: Option<String>,
    #[serde(default)]
    pub container_target: Option<String>,
    #[serde(default = "default_true")]
    pub use_managed_identity: bool,
}

impl JobRequest {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            container_source: None,
            container_target: None,
            use_managed_identity: true,
        }
    }
}

/// A required input that could not be resolved from the request or from
/// configuration fallbacks.
#[derive(Debug, thiserror::Error)]
#[error("missing required input: {field}")]
pub struct ValidationError {
    pub field: &'static str,
}

/// One validated extraction job, immutable for its lifetime.
#[derive(Clone, Debug)]
pub struct ArchiveJob {
    /// Correlation identifier; namespaces the job's workspace.
    pub id: String,
    pub source: BlobLocator,
    pub target_container: String,
    pub access: AccessMode,
}

impl ArchiveJob {
    /// Resolve a request against configuration fallbacks.
    ///
    /// Performs no side effects; every missing required value reports which
    /// field was absent.
    pub fn from_request(
        request: JobRequest,
        settings: &Settings,
    ) -> Result<Self, ValidationError> {
        let file_name =
            non_empty(Some(request.file_name)).ok_or(ValidationError { field: "fileName" })?;
        let container_source = non_empty(request.container_source)
            .or_else(|| non_empty(settings.container_source.clone()))
            .ok_or(ValidationError {
                field: "containerSource",
            })?;
        let target_container = non_empty(request.container_target)
            .or_else(|| non_empty(settings.container_target.clone()))
            .ok_or(ValidationError {
                field: "containerTarget",
            })?;

        let access = if request.use_managed_identity {
            AccessMode::Delegated
        } else {
            AccessMode::SharedKey
        };
        if access == AccessMode::SharedKey
            && non_empty(settings.shared_credential.clone()).is_none()
        {
            return Err(ValidationError {
                field: "sharedCredential",
            });
        }

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            source: BlobLocator::new(container_source, file_name),
            target_container,
            access,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// The complete contract the pipeline exposes upward: four outcomes, one
/// code each.
#[derive(Debug)]
pub enum Outcome {
    Done { published: usize },
    MissingInput(ValidationError),
    SourceNotFound,
    Failed(PipelineError),
}

impl Outcome {
    pub fn code(&self) -> &'static str {
        match self {
            Outcome::Done { .. } => "OK",
            Outcome::MissingInput(_) => "MISSING_INPUT",
            Outcome::SourceNotFound => "BLOB_NOT_EXIST",
            Outcome::Failed(_) => "INTERNAL_ERROR",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Done { .. })
    }
}
