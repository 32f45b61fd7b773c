//! External-service error mapping into HTTP errors.

use cascade_opendal::StorageError;

use super::{Error, ErrorKind};

const TRACING_TARGET: &str = "cascade_server::handler::error";

impl From<StorageError> for Error<'static> {
    fn from(error: StorageError) -> Self {
        tracing::error!(target: TRACING_TARGET, error = %error, "Object store error");
        ErrorKind::InternalServerError.with_context("object store unavailable")
    }
}

impl From<cascade_nats::Error> for Error<'static> {
    fn from(error: cascade_nats::Error) -> Self {
        tracing::error!(target: TRACING_TARGET, error = %error, "Executor queue error");
        ErrorKind::InternalServerError.with_context("executor queue unavailable")
    }
}
