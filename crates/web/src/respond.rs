//! Response-shaping helpers shared by all controllers.
//!
//! Success bodies are always JSON; the status code is the only thing that
//! varies per operation. Serialization failure is an `Internal` error: it
//! means a representation type is broken, not that the client misbehaved.

use bytes::Bytes;
use http::{Response, StatusCode};
use serde::Serialize;

use crate::error::HttpError;

const ORIGIN: &str = "respond";

/// `200 OK` with a serialized body.
pub fn ok<T: Serialize>(value: &T) -> Result<Response<Bytes>, HttpError> {
    send(StatusCode::OK, value)
}

/// `201 Created` with a serialized body.
pub fn created<T: Serialize>(value: &T) -> Result<Response<Bytes>, HttpError> {
    send(StatusCode::CREATED, value)
}

/// `204 No Content`, empty body.
pub fn no_content() -> Result<Response<Bytes>, HttpError> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .body(Bytes::new())
        .map_err(|e| HttpError::internal(format!("response build failed: {e}"), ORIGIN))
}

/// Status-coded JSON send; the helpers above are the common cases.
pub fn send<T: Serialize>(status: StatusCode, value: &T) -> Result<Response<Bytes>, HttpError> {
    let body = serde_json::to_vec(value)
        .map_err(|e| HttpError::internal(format!("representation did not serialize: {e}"), ORIGIN))?;
    Response::builder()
        .status(status)
        .header(http::header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
        .body(Bytes::from(body))
        .map_err(|e| HttpError::internal(format!("response build failed: {e}"), ORIGIN))
}
