//! Handler trait and the async-fn adapter.
//!
//! A handler owns the domain operation behind a route. It runs only after the
//! whole middleware chain returned `Continue`, receives the context by value
//! (attachments included) and either produces the success response or raises
//! a typed error for the exception filter.

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use http::Response;

use crate::context::RequestContext;
use crate::error::HttpError;

#[async_trait::async_trait]
pub trait Handler: Send + Sync {
    async fn invoke(&self, ctx: RequestContext) -> Result<Response<Bytes>, HttpError>;
}

pub(crate) type BoxHandler = Arc<dyn Handler>;

/// Adapter that lets any suitable async fn or closure serve as a [`Handler`].
///
/// Handlers that need collaborators are closures capturing them, which keeps
/// dependencies explicit and mockable:
///
/// ```rust,ignore
/// let service = Arc::clone(&comment_service);
/// handler_fn(move |ctx| {
///     let service = Arc::clone(&service);
///     async move { /* use service */ }
/// })
/// ```
pub struct FnHandler<F>(F);

pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(RequestContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response<Bytes>, HttpError>> + Send,
{
    FnHandler(f)
}

#[async_trait::async_trait]
impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(RequestContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response<Bytes>, HttpError>> + Send,
{
    async fn invoke(&self, ctx: RequestContext) -> Result<Response<Bytes>, HttpError> {
        (self.0)(ctx).await
    }
}
