use crate::context::RequestContext;
use crate::error::HttpError;
use crate::middleware::{Middleware, Outcome};

const ORIGIN: &str = "ValidateObjectId";

/// Rejects requests whose named path parameter is not a well-formed record
/// id: exactly 24 lowercase hex characters.
pub struct ValidateObjectId {
    param: &'static str,
}

impl ValidateObjectId {
    pub fn new(param: &'static str) -> Self {
        Self { param }
    }
}

fn is_object_id(candidate: &str) -> bool {
    candidate.len() == 24 && candidate.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

#[async_trait::async_trait]
impl Middleware for ValidateObjectId {
    async fn apply(&self, ctx: &mut RequestContext) -> Outcome {
        match ctx.param(self.param) {
            Some(id) if is_object_id(id) => Outcome::Continue,
            Some(id) => Outcome::Abort(HttpError::validation(format!("`{id}` is not a valid id"), ORIGIN)),
            None => Outcome::Abort(HttpError::validation(
                format!("path parameter `{}` is missing", self.param),
                ORIGIN,
            )),
        }
    }
}
