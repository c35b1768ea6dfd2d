//! Streaming archive reading with storage-safe name sanitization.
//!
//! # Architecture
//!
//! - `sanitize.rs` - Entry name normalization for the destination store
//! - `reader.rs` - Lazy, single-pass iteration over archive entries
//!
//! The reader locates the archive directory by scanning from the end of the
//! file, so archives with leading junk before the first entry still open.
//! Entry names are decoded from their raw bytes as UTF-8; no encoding
//! detection is performed.

pub use error::{Error, Result};
pub use reader::{ArchiveEntry, ArchiveReader};
pub use sanitize::sanitize_key;

mod error;
mod reader;
mod sanitize;
