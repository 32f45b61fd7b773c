//! Database error mapping into HTTP errors.

use cascade_postgres::PgError;
use cascade_postgres::error::DieselError;

use super::{Error, ErrorKind};

const TRACING_TARGET: &str = "cascade_server::handler::error";

impl From<PgError> for Error<'static> {
    fn from(error: PgError) -> Self {
        if error.is_not_found() {
            return ErrorKind::NotFound.into_error();
        }

        if let Some(constraint) = error.constraint() {
            tracing::warn!(
                target: TRACING_TARGET,
                constraint = %constraint,
                "Database constraint violation"
            );
            return ErrorKind::Conflict.with_context(constraint.to_owned());
        }

        tracing::error!(target: TRACING_TARGET, error = %error, "Database error");
        ErrorKind::InternalServerError.into_error()
    }
}

impl From<DieselError> for Error<'static> {
    fn from(error: DieselError) -> Self {
        Error::from(PgError::from(error))
    }
}
