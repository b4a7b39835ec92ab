use std::sync::Arc;

use crate::capability::DocumentLookup;
use crate::context::RequestContext;
use crate::error::HttpError;
use crate::middleware::{Middleware, Outcome};

const ORIGIN: &str = "DocumentExists";

/// Aborts with `NotFound` when the record named by a path parameter does not
/// exist, so handlers behind it can assume the id resolves.
pub struct DocumentExists {
    lookup: Arc<dyn DocumentLookup>,
    entity: &'static str,
    param: &'static str,
}

impl DocumentExists {
    pub fn new(lookup: Arc<dyn DocumentLookup>, entity: &'static str, param: &'static str) -> Self {
        Self { lookup, entity, param }
    }
}

#[async_trait::async_trait]
impl Middleware for DocumentExists {
    async fn apply(&self, ctx: &mut RequestContext) -> Outcome {
        let Some(id) = ctx.param(self.param) else {
            return Outcome::Abort(HttpError::validation(
                format!("path parameter `{}` is missing", self.param),
                ORIGIN,
            ));
        };
        match self.lookup.exists(id).await {
            Ok(true) => Outcome::Continue,
            Ok(false) => Outcome::Abort(HttpError::not_found(
                format!("{} with id {id} not found", self.entity),
                ORIGIN,
            )),
            Err(error) => Outcome::Abort(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::MockDocumentLookup;
    use crate::context::PathParams;
    use crate::ErrorKind;
    use bytes::Bytes;
    use http::{Method, Request};

    fn ctx() -> RequestContext {
        let mut params = PathParams::empty();
        params.insert("offerId", "6329c3d6a04ab1061c6425ea");
        let request = Request::builder().method(Method::GET).uri("/offers/x").body(Bytes::new()).unwrap();
        RequestContext::new(request, params)
    }

    #[tokio::test]
    async fn continues_when_the_document_exists() {
        let mut lookup = MockDocumentLookup::new();
        lookup.expect_exists().withf(|id| id == "6329c3d6a04ab1061c6425ea").returning(|_| Ok(true));
        let mw = DocumentExists::new(Arc::new(lookup), "offer", "offerId");
        assert!(matches!(mw.apply(&mut ctx()).await, Outcome::Continue));
    }

    #[tokio::test]
    async fn aborts_not_found_when_absent() {
        let mut lookup = MockDocumentLookup::new();
        lookup.expect_exists().returning(|_| Ok(false));
        let mw = DocumentExists::new(Arc::new(lookup), "offer", "offerId");
        let Outcome::Abort(err) = mw.apply(&mut ctx()).await else { panic!("continued") };
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.message().contains("offer"));
    }

    #[tokio::test]
    async fn propagates_lookup_failures() {
        let mut lookup = MockDocumentLookup::new();
        lookup.expect_exists().returning(|_| Err(HttpError::internal("store down", "test")));
        let mw = DocumentExists::new(Arc::new(lookup), "offer", "offerId");
        let Outcome::Abort(err) = mw.apply(&mut ctx()).await else { panic!("continued") };
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
