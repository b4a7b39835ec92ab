use std::sync::Arc;

use crate::capability::OwnershipLookup;
use crate::context::RequestContext;
use crate::error::HttpError;
use crate::middleware::{Middleware, Outcome};
use crate::token::TokenPayload;

const ORIGIN: &str = "Authorship";

/// Aborts with `Forbidden` unless the authenticated principal owns the
/// record named by a path parameter.
///
/// Must run after `ParseToken`; a missing principal here reads as an
/// unauthenticated request, not as a server bug.
pub struct Authorship {
    lookup: Arc<dyn OwnershipLookup>,
    entity: &'static str,
    param: &'static str,
}

impl Authorship {
    pub fn new(lookup: Arc<dyn OwnershipLookup>, entity: &'static str, param: &'static str) -> Self {
        Self { lookup, entity, param }
    }
}

#[async_trait::async_trait]
impl Middleware for Authorship {
    async fn apply(&self, ctx: &mut RequestContext) -> Outcome {
        let Some(payload) = ctx.attachment::<TokenPayload>() else {
            return Outcome::Abort(HttpError::unauthorized("authorization required", ORIGIN));
        };
        let Some(id) = ctx.param(self.param) else {
            return Outcome::Abort(HttpError::validation(
                format!("path parameter `{}` is missing", self.param),
                ORIGIN,
            ));
        };
        match self.lookup.owner_of(id).await {
            Ok(Some(owner)) if owner == payload.id => Outcome::Continue,
            Ok(Some(_)) => Outcome::Abort(HttpError::forbidden(
                format!("{} {id} belongs to another user", self.entity),
                ORIGIN,
            )),
            Ok(None) => Outcome::Abort(HttpError::not_found(
                format!("{} with id {id} not found", self.entity),
                ORIGIN,
            )),
            Err(error) => Outcome::Abort(error),
        }
    }
}
