//! The terminal error-to-response translator.
//!
//! Every failure path in the pipeline converges here exactly once per failed
//! request: unmatched routes, middleware aborts, handler errors and caught
//! panics. The filter never re-enters the middleware chain; it only shapes
//! the one response the client will see.

use bytes::Bytes;
use http::Response;
use tracing::{error, warn};

use crate::error::{ErrorKind, ErrorResponse, HttpError};

pub trait ExceptionFilter: Send + Sync {
    fn handle(&self, error: &HttpError) -> Response<Bytes>;
}

/// The default filter.
///
/// Anticipated kinds map straight to their status and stable `errorType`;
/// `Internal` is logged with full origin context and surfaced as a generic
/// message, so diagnostic detail never leaks into the response body.
pub struct AppExceptionFilter;

impl ExceptionFilter for AppExceptionFilter {
    fn handle(&self, error: &HttpError) -> Response<Bytes> {
        let kind = error.kind();
        let (message, details) = if kind == ErrorKind::Internal {
            error!(origin = error.origin(), message = error.message(), "unexpected failure");
            ("internal server error", None)
        } else {
            warn!(
                origin = error.origin(),
                kind = kind.error_type(),
                message = error.message(),
                "request failed"
            );
            (error.message(), error.details())
        };

        let status = kind.status();
        let body = ErrorResponse {
            status_code: status.as_u16(),
            error_type: kind.error_type(),
            message,
            details,
        };
        // ErrorResponse is a plain struct of serializable fields; encoding it
        // cannot fail.
        let bytes = serde_json::to_vec(&body).unwrap_or_default();

        Response::builder()
            .status(status)
            .header(http::header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
            .body(Bytes::from(bytes))
            .unwrap_or_else(|_| Response::new(Bytes::new()))
    }
}
