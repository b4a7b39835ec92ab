//! Typed failure model.
//!
//! Every failure raised during routing, middleware execution or handling is an
//! [`HttpError`]: a categorized kind, a message, the component that raised it
//! and optional structured details. The error is immutable once raised and a
//! request produces at most one of them. [`ErrorResponse`] is the only failure
//! shape ever serialized to a client.

use http::{Method, StatusCode};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Failure taxonomy, mapped to a fixed status code and a stable wire string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input: bad id format, schema violations, bad upload.
    Validation,
    /// Missing or invalid credential on a route that requires one.
    Unauthorized,
    /// Authenticated but not entitled, e.g. an ownership mismatch.
    Forbidden,
    /// A referenced resource or document is absent.
    NotFound,
    /// Domain-level uniqueness or state conflict, raised by handlers.
    Conflict,
    /// Anything unanticipated. Internal detail never reaches the client.
    Internal,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The stable `errorType` string clients may switch on.
    pub fn error_type(self) -> &'static str {
        match self {
            ErrorKind::Validation => "Validation",
            ErrorKind::Unauthorized => "Unauthorized",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::Internal => "Internal",
        }
    }
}

/// A categorized failure raised by a middleware, a handler or the dispatcher.
#[derive(Debug, Error)]
#[error("{origin}: {message}")]
pub struct HttpError {
    kind: ErrorKind,
    message: String,
    origin: &'static str,
    details: Option<Value>,
}

impl HttpError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, origin: &'static str) -> Self {
        Self { kind, message: message.into(), origin, details: None }
    }

    /// Attaches structured sub-violations, e.g. field-level validation errors.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn validation(message: impl Into<String>, origin: &'static str) -> Self {
        Self::new(ErrorKind::Validation, message, origin)
    }

    pub fn unauthorized(message: impl Into<String>, origin: &'static str) -> Self {
        Self::new(ErrorKind::Unauthorized, message, origin)
    }

    pub fn forbidden(message: impl Into<String>, origin: &'static str) -> Self {
        Self::new(ErrorKind::Forbidden, message, origin)
    }

    pub fn not_found(message: impl Into<String>, origin: &'static str) -> Self {
        Self::new(ErrorKind::NotFound, message, origin)
    }

    pub fn conflict(message: impl Into<String>, origin: &'static str) -> Self {
        Self::new(ErrorKind::Conflict, message, origin)
    }

    pub fn internal(message: impl Into<String>, origin: &'static str) -> Self {
        Self::new(ErrorKind::Internal, message, origin)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The component that raised the error, for diagnostics only.
    pub fn origin(&self) -> &'static str {
        self.origin
    }

    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }
}

/// The wire shape of a failed request. Serialized by the exception filter and
/// nowhere else.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse<'a> {
    pub status_code: u16,
    pub error_type: &'static str,
    pub message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<&'a Value>,
}

/// Errors surfaced while the route table is being built. These abort startup;
/// they are never seen at request time.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("duplicate route {method} {path}")]
    DuplicateRoute { method: Method, path: String },

    #[error("invalid route pattern `{path}`: {reason}")]
    InvalidPattern { path: String, reason: String },

    #[error("invalid schema for `{name}`: {reason}")]
    InvalidSchema { name: String, reason: String },
}
