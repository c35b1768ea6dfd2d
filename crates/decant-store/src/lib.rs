//! Minimal blob store boundary.
//!
//! The rest of the system depends on exactly three store operations -
//! existence check, download to a local file, overwriting upload - plus the
//! ability to construct an authenticated client from one of two access
//! modes. Everything else a real store offers is deliberately out of reach.
//!
//! # Architecture
//!
//! - `locator.rs` - Container + key addressing
//! - `auth.rs` - Access modes and credential sources
//! - `client.rs` - The `BlobStore` / `StoreProvider` seams
//! - `http.rs` - Production client backed by `reqwest`
//! - `memory.rs` - In-memory client for tests and dry runs

pub use auth::{AccessMode, EnvTokenSource, StoreAuth, TokenSource};
pub use client::{BlobStore, ByteStream, StoreProvider, byte_stream};
pub use error::StoreError;
pub use http::{HttpBlobStore, HttpStoreProvider};
pub use locator::BlobLocator;
pub use memory::{MemoryProvider, MemoryStore};

mod auth;
mod client;
mod error;
mod http;
mod locator;
mod memory;
