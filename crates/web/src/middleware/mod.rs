//! Middleware: ordered, suspendable, fail-fast pre-processing.
//!
//! A middleware is one async step over the request context. Each invocation
//! produces exactly one [`Outcome`]:
//!
//! - [`Outcome::Continue`]: proceed to the next step, or to the handler
//!   after the last one
//! - [`Outcome::ShortCircuit`]: stop; the given response is sent verbatim
//! - [`Outcome::Abort`]: stop; the typed error goes to the exception filter
//!
//! The chain executor runs steps strictly in registration order and never
//! concurrently: later middleware may depend on attachments written by
//! earlier ones. There is no continue-on-error mode and no fan-out.
//!
//! Steps that consume an attachment (`PrivateRoute`, `Authorship`) must be
//! registered after the step that produces it (`ParseToken`). That ordering
//! is a configuration contract, not something the executor enforces; keep
//! it covered by tests.

mod authorship;
mod document_exists;
mod parse_token;
mod private_route;
mod upload_file;
mod validate_dto;
mod validate_object_id;

pub use authorship::Authorship;
pub use document_exists::DocumentExists;
pub use parse_token::ParseToken;
pub use private_route::PrivateRoute;
pub use upload_file::{UploadFile, UploadPolicy};
pub use validate_dto::ValidateDto;
pub use validate_object_id::ValidateObjectId;

use std::sync::Arc;

use bytes::Bytes;
use http::Response;

use crate::context::RequestContext;
use crate::error::HttpError;

/// The single capability a middleware exposes: inspect or transform the
/// context, then decide how the request proceeds.
#[async_trait::async_trait]
pub trait Middleware: Send + Sync {
    async fn apply(&self, ctx: &mut RequestContext) -> Outcome;
}

/// What one middleware invocation decided.
#[derive(Debug)]
pub enum Outcome {
    Continue,
    ShortCircuit(Response<Bytes>),
    Abort(HttpError),
}

/// How a whole chain run ended.
#[derive(Debug)]
pub enum ChainResult {
    /// Every step returned [`Outcome::Continue`]; the handler may run.
    Completed,
    /// Some step short-circuited; send this response verbatim.
    Responded(Response<Bytes>),
    /// Some step aborted; hand the error to the exception filter.
    Failed(HttpError),
}

/// Executes `chain` sequentially against `ctx`, stopping at the first
/// non-`Continue` outcome.
pub async fn run_chain(chain: &[Arc<dyn Middleware>], ctx: &mut RequestContext) -> ChainResult {
    for step in chain {
        match step.apply(ctx).await {
            Outcome::Continue => {}
            Outcome::ShortCircuit(response) => return ChainResult::Responded(response),
            Outcome::Abort(error) => return ChainResult::Failed(error),
        }
    }
    ChainResult::Completed
}
