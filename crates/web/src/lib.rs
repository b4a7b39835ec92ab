//! # portico-web
//!
//! The request-handling backbone for HTTP services: a route table, an ordered
//! per-route middleware chain and a centralized error-to-response translator.
//!
//! The crate does not open sockets. The surrounding transport accepts
//! connections, parses HTTP and hands each request to [`Dispatcher::dispatch`],
//! which resolves the route, drives the middleware chain and always produces
//! exactly one response: from the handler, from a middleware short-circuit or
//! from the [`ExceptionFilter`].
//!
//! ## Building blocks
//!
//! - [`RequestContext`]: per-request bundle of inputs plus write-once
//!   attachments filled in as middleware runs
//! - [`Middleware`]: one async step that continues, short-circuits with a
//!   response, or aborts with a typed error
//! - [`Controller`]: a base path plus an ordered set of routes
//! - [`Router`] / [`Dispatcher`]: immutable route table and the per-request
//!   execution loop
//! - [`ExceptionFilter`]: the single place every failure path converges
//!
//! ## Quick start
//!
//! ```rust
//! use bytes::Bytes;
//! use http::Method;
//! use portico_web::{handler_fn, respond, Controller, Dispatcher, Router};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let controller = Controller::new("/health").route(
//!     Method::GET,
//!     "/",
//!     vec![],
//!     handler_fn(|_ctx| async { respond::ok(&serde_json::json!({"status": "up"})) }),
//! );
//!
//! let router = Router::builder().mount(controller).build().unwrap();
//! let dispatcher = Dispatcher::new(router);
//!
//! let request = http::Request::builder()
//!     .method(Method::GET)
//!     .uri("/health")
//!     .body(Bytes::new())
//!     .unwrap();
//! let response = dispatcher.dispatch(request).await;
//! assert_eq!(response.status(), http::StatusCode::OK);
//! # }
//! ```

mod context;
mod dispatcher;
mod error;
mod filter;
mod handler;
mod router;
mod schema;
mod token;

pub mod capability;
pub mod middleware;
pub mod multipart;
pub mod respond;

pub use context::{Attachments, PathParams, RequestContext};
pub use dispatcher::Dispatcher;
pub use error::{ConfigError, ErrorKind, ErrorResponse, HttpError};
pub use filter::{AppExceptionFilter, ExceptionFilter};
pub use handler::{handler_fn, FnHandler, Handler};
pub use router::{Controller, Route, Router, RouterBuilder};
pub use schema::{DtoSchema, Violation};
pub use token::{TokenCodec, TokenPayload};
