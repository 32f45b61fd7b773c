//! Enhanced extractors that reject into the handler error type.
//!
//! Drop-in replacements for the stock axum extractors: same behaviour on
//! success, but rejections serialize as the standard [`ErrorResponse`] body
//! instead of axum's plain-text defaults.
//!
//! [`ErrorResponse`]: crate::handler::response::ErrorResponse

use aide::OperationIo;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, Request};
use axum::response::{IntoResponse, Response};
use derive_more::{Deref, DerefMut, From};
use serde::Serialize;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::handler::{Error, ErrorKind};

/// JSON extractor with structured rejections.
///
/// Also used as the response body wrapper, mirroring `axum::Json`.
#[must_use]
#[derive(Debug, Clone, Copy, Default, Deref, DerefMut, From)]
#[derive(axum::extract::FromRequest, OperationIo)]
#[from_request(via(axum::Json), rejection(Error<'static>))]
#[aide(
    input_with = "axum::Json<T>",
    output_with = "axum::Json<T>",
    json_schema
)]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Path extractor with structured rejections.
#[must_use]
#[derive(Debug, Clone, Copy, Default, Deref, DerefMut, From)]
#[derive(axum::extract::FromRequestParts, OperationIo)]
#[from_request(via(axum::extract::Path), rejection(Error<'static>))]
#[aide(input_with = "axum::extract::Path<T>", json_schema)]
pub struct Path<T>(pub T);

/// Query extractor with structured rejections.
#[must_use]
#[derive(Debug, Clone, Copy, Default, Deref, DerefMut, From)]
#[derive(axum::extract::FromRequestParts, OperationIo)]
#[from_request(via(axum::extract::Query), rejection(Error<'static>))]
#[aide(input_with = "axum::extract::Query<T>", json_schema)]
pub struct Query<T>(pub T);

/// JSON extractor with automatic validation via the `validator` crate.
///
/// Deserializes like [`Json`], then runs `Validate::validate` and rejects
/// with a field-by-field message on failure.
#[must_use]
#[derive(Debug, Clone, Copy, Default, Deref, DerefMut, From, OperationIo)]
#[aide(input_with = "axum::Json<T>", json_schema)]
pub struct ValidateJson<T>(pub T);

impl<T> ValidateJson<T> {
    /// Returns the inner validated value.
    #[inline]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T, S> FromRequest<S> for ValidateJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = Error<'static>;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = <Json<T> as FromRequest<S>>::from_request(req, state).await?;
        data.validate()?;
        Ok(Self(data))
    }
}

impl From<JsonRejection> for Error<'static> {
    fn from(rejection: JsonRejection) -> Self {
        ErrorKind::BadRequest
            .with_message("Malformed JSON request body")
            .with_context(rejection.body_text())
    }
}

impl From<PathRejection> for Error<'static> {
    fn from(rejection: PathRejection) -> Self {
        ErrorKind::BadRequest
            .with_message("Malformed path parameter")
            .with_context(rejection.body_text())
    }
}

impl From<QueryRejection> for Error<'static> {
    fn from(rejection: QueryRejection) -> Self {
        ErrorKind::BadRequest
            .with_message("Malformed query string")
            .with_context(rejection.body_text())
    }
}

impl From<ValidationErrors> for Error<'static> {
    fn from(errors: ValidationErrors) -> Self {
        let details: Vec<String> = errors
            .field_errors()
            .iter()
            .map(|(field, field_errors)| {
                let codes: Vec<&str> = field_errors
                    .iter()
                    .map(|error| error.code.as_ref())
                    .collect();
                format!("{}: {}", field, codes.join(", "))
            })
            .collect();

        ErrorKind::BadRequest
            .with_message("Request validation failed")
            .with_context(details.join("; "))
    }
}
