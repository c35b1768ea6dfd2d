//! decant - republish the files inside an archived blob as individual
//! objects in a destination container.
//!
//! One job: fetch the archive object, stage it in an exclusive local
//! workspace, walk its entries once, publish each file under a sanitized
//! key, then tear the workspace down with bounded retries. Jobs either
//! publish every file entry or fail as a whole; there is no partial-success
//! state.
//!
//! # Architecture
//!
//! - `config.rs` - Layered settings (file, then environment)
//! - `job.rs` - Request payload, validated job, user-visible outcomes
//! - `workspace.rs` - Exclusive staging directory per job
//! - `source.rs` - Staging the remote archive into the workspace
//! - `publish.rs` - Uploading one entry's content stream
//! - `pipeline.rs` - The orchestrating state machine

pub use error::PipelineError;
pub use job::{ArchiveJob, JobRequest, Outcome, ValidationError};
pub use pipeline::Pipeline;

pub mod config;
mod error;
pub mod job;
pub mod pipeline;
pub mod publish;
pub mod source;
pub mod workspace;
