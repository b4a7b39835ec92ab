use std::sync::Arc;

use http::header::AUTHORIZATION;
use tracing::debug;

use crate::capability::TokenDecoder;
use crate::context::RequestContext;
use crate::middleware::{Middleware, Outcome};
use crate::token::TokenPayload;

/// Decodes an optional bearer credential and attaches the payload.
///
/// This step never fails the request on its own: a missing or invalid
/// credential simply leaves no [`TokenPayload`] attachment, and the decision
/// belongs to `PrivateRoute` further down the chain. That leniency is what
/// makes optional-auth routes possible.
pub struct ParseToken {
    decoder: Arc<dyn TokenDecoder>,
}

impl ParseToken {
    pub fn new(decoder: Arc<dyn TokenDecoder>) -> Self {
        Self { decoder }
    }
}

#[async_trait::async_trait]
impl Middleware for ParseToken {
    async fn apply(&self, ctx: &mut RequestContext) -> Outcome {
        let Some(header) = ctx.header(AUTHORIZATION) else {
            return Outcome::Continue;
        };
        let Some(token) = header.strip_prefix("Bearer ") else {
            debug!("authorization header is not a bearer credential");
            return Outcome::Continue;
        };
        match self.decoder.decode(token).await {
            Some(payload) => match ctx.attach::<TokenPayload>(payload) {
                Ok(()) => Outcome::Continue,
                Err(error) => Outcome::Abort(error),
            },
            None => {
                debug!("invalid credential, continuing without a principal");
                Outcome::Continue
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::PathParams;
    use crate::token::TokenCodec;
    use bytes::Bytes;
    use http::{Method, Request};

    fn ctx(auth: Option<&str>) -> RequestContext {
        let mut builder = Request::builder().method(Method::POST).uri("/comments");
        if let Some(value) = auth {
            builder = builder.header(AUTHORIZATION, value);
        }
        RequestContext::new(builder.body(Bytes::new()).unwrap(), PathParams::empty())
    }

    fn parse_token() -> (ParseToken, TokenCodec) {
        let codec = TokenCodec::new("secret");
        (ParseToken::new(Arc::new(TokenCodec::new("secret"))), codec)
    }

    #[tokio::test]
    async fn valid_credential_attaches_the_payload() {
        let (mw, codec) = parse_token();
        let payload = TokenPayload { id: "u1".into(), email: "a@b.c".into(), name: "A".into() };
        let token = codec.issue(&payload);

        let mut ctx = ctx(Some(&format!("Bearer {token}")));
        assert!(matches!(mw.apply(&mut ctx).await, Outcome::Continue));
        assert_eq!(ctx.attachment::<TokenPayload>(), Some(&payload));
    }

    #[tokio::test]
    async fn absent_credential_continues_without_attachment() {
        let (mw, _) = parse_token();
        let mut ctx = ctx(None);
        assert!(matches!(mw.apply(&mut ctx).await, Outcome::Continue));
        assert!(ctx.attachment::<TokenPayload>().is_none());
    }

    #[tokio::test]
    async fn invalid_credential_continues_without_attachment() {
        let (mw, _) = parse_token();
        let mut ctx = ctx(Some("Bearer not.a.token"));
        assert!(matches!(mw.apply(&mut ctx).await, Outcome::Continue));
        assert!(ctx.attachment::<TokenPayload>().is_none());
    }

    #[tokio::test]
    async fn non_bearer_scheme_continues_without_attachment() {
        let (mw, _) = parse_token();
        let mut ctx = ctx(Some("Basic dXNlcjpwYXNz"));
        assert!(matches!(mw.apply(&mut ctx).await, Outcome::Continue));
        assert!(ctx.attachment::<TokenPayload>().is_none());
    }
}
