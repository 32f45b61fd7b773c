//! Serialized error payloads.

use std::borrow::Cow;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use schemars::JsonSchema;
use serde::Serialize;

/// The JSON body returned for every error.
#[derive(Debug, Clone, Serialize, JsonSchema)]
#[must_use = "responses do nothing unless returned"]
pub struct ErrorResponse {
    /// Machine-readable error name.
    pub name: &'static str,
    /// HTTP status code of the response.
    #[serde(skip)]
    #[schemars(skip)]
    pub status: StatusCode,
    /// Human-readable error message.
    pub message: Cow<'static, str>,
    /// Resource the error refers to, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    /// Additional debugging context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl ErrorResponse {
    /// 400 Bad Request.
    pub const BAD_REQUEST: Self = Self::new(
        "bad_request",
        StatusCode::BAD_REQUEST,
        "The request is invalid.",
    );

    /// 404 Not Found.
    pub const NOT_FOUND: Self = Self::new(
        "not_found",
        StatusCode::NOT_FOUND,
        "The requested resource does not exist.",
    );

    /// 409 Conflict.
    pub const CONFLICT: Self = Self::new(
        "conflict",
        StatusCode::CONFLICT,
        "The request conflicts with the current resource state.",
    );

    /// 500 Internal Server Error.
    pub const INTERNAL_SERVER_ERROR: Self = Self::new(
        "internal_server_error",
        StatusCode::INTERNAL_SERVER_ERROR,
        "An unexpected error occurred.",
    );

    const fn new(name: &'static str, status: StatusCode, message: &'static str) -> Self {
        Self {
            name,
            status,
            message: Cow::Borrowed(message),
            resource: None,
            context: None,
        }
    }

    /// Overrides the message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Cow::Owned(message.into());
        self
    }

    /// Sets the resource.
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Sets the context.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}
