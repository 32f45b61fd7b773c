//! Enhanced HTTP request extractors with improved error handling.

mod reject;

pub use reject::{Json, Path, Query, ValidateJson};
