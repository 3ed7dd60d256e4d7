//! # Readbench Client
//!
//! A small client for reading objects from Google Cloud Storage, used by the `readbench`
//! benchmark. It exposes a single capability interface, [`Storage`], which supports two operations:
//! looking up object metadata and opening a streaming read over a byte range.
//!
//! There are two interchangeable implementations, selected at construction time through
//! [`Variant::connect`]:
//!
//! - [`RestStorage`] talks to the JSON API over HTTP.
//! - [`GrpcStorage`] talks to the `google.storage.v2` gRPC API.
//!
//! ## Usage
//!
//! ```no_run
//! use futures_util::TryStreamExt;
//! use readbench_client::{Credentials, Endpoints, ObjectPath, ReadRange, Storage, Variant};
//!
//! #[tokio::main]
//! # async fn main() -> readbench_client::Result<()> {
//!     let endpoints = Endpoints::testbench();
//!     let storage = Variant::Rest.connect(&endpoints, Credentials::anonymous())?;
//!
//!     let path = ObjectPath::new("test-bucket", "test-object");
//!     let size = storage.metadata(&path).await?.size;
//!     let stream = storage.read(&path, ReadRange::bounded(0, size.min(1024))).await?;
//!     let chunks: Vec<_> = stream.try_collect().await?;
//! # Ok(())
//! # }
//! ```
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

mod auth;
mod error;
mod grpc;
mod in_memory;
mod rest;
mod storage;
mod variant;

pub use auth::*;
pub use error::*;
pub use grpc::GrpcStorage;
pub use in_memory::*;
pub use rest::RestStorage;
pub use storage::*;
pub use variant::*;
