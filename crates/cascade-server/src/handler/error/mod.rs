//! HTTP error types and mappings from every error source in the app.

mod http_error;
mod pg_error;
mod runtime_error;
mod service_error;

pub use http_error::{Error, ErrorKind, Result};
