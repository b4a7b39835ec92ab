use std::sync::Arc;

use crate::context::RequestContext;
use crate::error::HttpError;
use crate::middleware::{Middleware, Outcome};
use crate::schema::DtoSchema;

const ORIGIN: &str = "ValidateDto";

/// Rejects bodies that do not satisfy the declared DTO schema. On failure the
/// per-field violation list travels in the error `details`, so clients see
/// every problem at once rather than one per round trip.
pub struct ValidateDto {
    schema: Arc<DtoSchema>,
}

impl ValidateDto {
    pub fn new(schema: Arc<DtoSchema>) -> Self {
        Self { schema }
    }
}

#[async_trait::async_trait]
impl Middleware for ValidateDto {
    async fn apply(&self, ctx: &mut RequestContext) -> Outcome {
        match self.schema.check(ctx.body()) {
            Ok(_) => Outcome::Continue,
            Err(violations) => {
                let details = match serde_json::to_value(&violations) {
                    Ok(details) => details,
                    Err(e) => {
                        return Outcome::Abort(HttpError::internal(
                            format!("violations did not serialize: {e}"),
                            ORIGIN,
                        ))
                    }
                };
                Outcome::Abort(
                    HttpError::validation(format!("body does not match {}", self.schema.name()), ORIGIN)
                        .with_details(details),
                )
            }
        }
    }
}
