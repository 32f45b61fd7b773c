#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod backend;
mod config;
mod error;
mod key;

pub use backend::StorageBackend;
pub use config::S3Config;
pub use error::{StorageError, StorageResult};
pub use key::{ArtifactKey, sanitize_filename};

/// Tracing target for storage operations.
pub const TRACING_TARGET: &str = "cascade_opendal";
