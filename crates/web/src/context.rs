//! Per-request context: parsed inputs plus write-once attachments.
//!
//! A [`RequestContext`] is built fresh for every dispatched request and owned
//! exclusively by it; nothing here is shared across requests. Middleware may
//! read the inputs and write attachments; the handler receives the context by
//! value once the chain has completed.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use bytes::Bytes;
use http::header::HeaderMap;
use http::{Method, Request};

use crate::error::HttpError;

/// Named path segments captured during route resolution.
///
/// For a route `/offers/{offerId}`, a request to `/offers/42` yields
/// `params.get("offerId") == Some("42")`.
#[derive(Debug, Clone, Default)]
pub struct PathParams {
    inner: HashMap<String, String>,
}

impl PathParams {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.insert(name.into(), value.into());
    }
}

impl<'k, 'v> From<matchit::Params<'k, 'v>> for PathParams {
    fn from(params: matchit::Params<'k, 'v>) -> Self {
        let mut out = Self::default();
        for (k, v) in params.iter() {
            out.insert(k, v);
        }
        out
    }
}

/// Write-once typed storage filled in by middleware and read by later steps
/// or the handler.
///
/// Keys are types: one `TokenPayload`, one `StoredFile`, and so on. Writing
/// the same type twice within a request is rejected: chains are sequential,
/// so a duplicate write is always a configuration mistake, not a race.
#[derive(Default)]
pub struct Attachments {
    map: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Attachments {
    /// Stores `value`, failing if an attachment of the same type is present.
    pub fn put<T: Send + Sync + 'static>(&mut self, value: T) -> Result<(), HttpError> {
        if self.map.contains_key(&TypeId::of::<T>()) {
            return Err(HttpError::internal(
                format!("attachment {} written twice", std::any::type_name::<T>()),
                "Attachments",
            ));
        }
        self.map.insert(TypeId::of::<T>(), Box::new(value));
        Ok(())
    }

    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.map.get(&TypeId::of::<T>()).and_then(|boxed| boxed.downcast_ref())
    }

    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.map.contains_key(&TypeId::of::<T>())
    }
}

impl fmt::Debug for Attachments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachments").field("len", &self.map.len()).finish()
    }
}

/// The immutable-per-request bundle of inputs, plus mutable attachments.
///
/// The body stays opaque bytes until a middleware or handler decodes it; the
/// query string is parsed eagerly since it is cheap and always well-formed
/// enough to treat as a string map.
#[derive(Debug)]
pub struct RequestContext {
    method: Method,
    path: String,
    headers: HeaderMap,
    body: Bytes,
    params: PathParams,
    query: HashMap<String, String>,
    attachments: Attachments,
}

impl RequestContext {
    pub fn new(request: Request<Bytes>, params: PathParams) -> Self {
        let (parts, body) = request.into_parts();
        let query = parts
            .uri
            .query()
            .and_then(|q| serde_urlencoded::from_str::<HashMap<String, String>>(q).ok())
            .unwrap_or_default();
        Self {
            method: parts.method,
            path: parts.uri.path().to_owned(),
            headers: parts.headers,
            body,
            params,
            query,
            attachments: Attachments::default(),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Header lookup returning the value as a string, if it is valid UTF-8.
    pub fn header(&self, name: impl http::header::AsHeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    pub fn params(&self) -> &PathParams {
        &self.params
    }

    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// Decodes the body as JSON into a concrete DTO.
    ///
    /// Handlers call this after `ValidateDto` has accepted the body, so a
    /// decode failure here means the declared schema and the DTO type have
    /// drifted apart.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, HttpError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| HttpError::internal(format!("body does not match dto: {e}"), "RequestContext"))
    }

    pub fn attach<T: Send + Sync + 'static>(&mut self, value: T) -> Result<(), HttpError> {
        self.attachments.put(value)
    }

    pub fn attachment<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.attachments.get()
    }

    pub fn attachments(&self) -> &Attachments {
        &self.attachments
    }
}
