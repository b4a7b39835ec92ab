//! Per-request execution: resolve, run the chain, run the handler, respond.
//!
//! The dispatcher is invoked concurrently for many in-flight requests (one
//! logical task per request) and holds no mutable state of its own, so no
//! locking happens here. Within a request the flow is strictly sequential:
//! `Received → Routed → Middleware(0..n) → Handling → Responded`, with any
//! failure jumping straight to the exception filter. Exactly one response is
//! written per request; `Responded` is terminal by construction because the
//! response is returned by value.

use std::sync::Arc;

use bytes::Bytes;
use futures::FutureExt;
use http::{Request, Response};
use tracing::debug;

use crate::context::RequestContext;
use crate::error::HttpError;
use crate::filter::{AppExceptionFilter, ExceptionFilter};
use crate::middleware::{run_chain, ChainResult};
use crate::router::Router;

const ORIGIN: &str = "Dispatcher";

pub struct Dispatcher {
    router: Router,
    filter: Arc<dyn ExceptionFilter>,
}

impl Dispatcher {
    pub fn new(router: Router) -> Self {
        Self::with_filter(router, Arc::new(AppExceptionFilter))
    }

    pub fn with_filter(router: Router, filter: Arc<dyn ExceptionFilter>) -> Self {
        Self { router, filter }
    }

    /// Drives one request to its single response.
    ///
    /// No timeout or cancellation exists at this layer; the surrounding
    /// transport owns deadlines.
    pub async fn dispatch(&self, request: Request<Bytes>) -> Response<Bytes> {
        let method = request.method().clone();
        let path = request.uri().path().to_owned();

        let Some((route, params)) = self.router.lookup(&method, &path) else {
            debug!(%method, %path, "no route matched");
            return self
                .filter
                .handle(&HttpError::not_found(format!("{method} {path} is not a known operation"), ORIGIN));
        };
        debug!(%method, %path, route = route.path(), "routed");

        // Panics inside middleware or handlers are unexpected failures; they
        // are confined to this request and translated like any other
        // internal error.
        let execution = std::panic::AssertUnwindSafe(async {
            let mut ctx = RequestContext::new(request, params);
            match run_chain(&route.middleware, &mut ctx).await {
                ChainResult::Completed => route.handler.invoke(ctx).await,
                ChainResult::Responded(response) => Ok(response),
                ChainResult::Failed(error) => Err(error),
            }
        });

        match execution.catch_unwind().await {
            Ok(Ok(response)) => response,
            Ok(Err(error)) => self.filter.handle(&error),
            Err(panic) => {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_owned())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_owned());
                self.filter.handle(&HttpError::internal(format!("panic: {reason}"), ORIGIN))
            }
        }
    }
}
