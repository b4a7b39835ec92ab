use crate::context::RequestContext;
use crate::error::HttpError;
use crate::middleware::{Middleware, Outcome};
use crate::token::TokenPayload;

const ORIGIN: &str = "PrivateRoute";

/// Gate for routes that require an authenticated principal: aborts with
/// `Unauthorized` unless `ParseToken` attached a payload earlier in the chain.
pub struct PrivateRoute;

#[async_trait::async_trait]
impl Middleware for PrivateRoute {
    async fn apply(&self, ctx: &mut RequestContext) -> Outcome {
        if ctx.attachment::<TokenPayload>().is_some() {
            Outcome::Continue
        } else {
            Outcome::Abort(HttpError::unauthorized("authorization required", ORIGIN))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::PathParams;
    use crate::ErrorKind;
    use bytes::Bytes;
    use http::{Method, Request};

    fn ctx() -> RequestContext {
        let request = Request::builder().method(Method::POST).uri("/comments").body(Bytes::new()).unwrap();
        RequestContext::new(request, PathParams::empty())
    }

    #[tokio::test]
    async fn passes_with_a_principal() {
        let mut ctx = ctx();
        ctx.attach(TokenPayload { id: "u1".into(), email: "a@b.c".into(), name: "A".into() }).unwrap();
        assert!(matches!(PrivateRoute.apply(&mut ctx).await, Outcome::Continue));
    }

    #[tokio::test]
    async fn aborts_unauthorized_without_one() {
        let Outcome::Abort(err) = PrivateRoute.apply(&mut ctx()).await else { panic!("continued") };
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }
}
