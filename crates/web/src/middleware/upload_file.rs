use std::sync::Arc;

use http::header::CONTENT_TYPE;

use crate::capability::UploadStore;
use crate::context::RequestContext;
use crate::error::HttpError;
use crate::middleware::{Middleware, Outcome};
use crate::multipart::{self, Part, StoredFile};

const ORIGIN: &str = "UploadFile";

/// Size and content-type constraints applied before anything is persisted.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub max_size: usize,
    /// Accepted mime types, compared against the part's declared type.
    pub allowed: Vec<String>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_size: 5 * 1024 * 1024,
            allowed: vec![mime::IMAGE_PNG.to_string(), mime::IMAGE_JPEG.to_string()],
        }
    }
}

/// Decodes a multipart body, checks the named file part against the policy
/// and hands the bytes to the injected store. The resulting [`StoredFile`]
/// metadata is attached for the handler.
pub struct UploadFile {
    store: Arc<dyn UploadStore>,
    field: &'static str,
    policy: UploadPolicy,
}

impl UploadFile {
    pub fn new(store: Arc<dyn UploadStore>, field: &'static str, policy: UploadPolicy) -> Self {
        Self { store, field, policy }
    }

    fn select(&self, parts: Vec<Part>) -> Result<Part, HttpError> {
        let part = parts
            .into_iter()
            .find(|part| part.name == self.field && part.filename.is_some())
            .ok_or_else(|| {
                HttpError::validation(format!("file field `{}` is missing", self.field), ORIGIN)
            })?;

        if part.data.len() > self.policy.max_size {
            return Err(HttpError::validation(
                format!("file exceeds the {} byte limit", self.policy.max_size),
                ORIGIN,
            ));
        }

        let declared = part.content_type.clone().unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string());
        if !self.policy.allowed.iter().any(|allowed| allowed == &declared) {
            return Err(HttpError::validation(format!("content type `{declared}` is not accepted"), ORIGIN));
        }

        Ok(part)
    }
}

#[async_trait::async_trait]
impl Middleware for UploadFile {
    async fn apply(&self, ctx: &mut RequestContext) -> Outcome {
        let Some(content_type) = ctx.header(CONTENT_TYPE).map(str::to_owned) else {
            return Outcome::Abort(HttpError::validation("expected a multipart body", ORIGIN));
        };

        let parts = match multipart::parse(&content_type, ctx.body()) {
            Ok(parts) => parts,
            Err(e) => return Outcome::Abort(HttpError::validation(e.to_string(), ORIGIN)),
        };

        let part = match self.select(parts) {
            Ok(part) => part,
            Err(error) => return Outcome::Abort(error),
        };

        let original_name = part.filename.clone().unwrap_or_default();
        let mime = part.content_type.clone().unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string());
        match self.store.persist(&original_name, &mime, part.data).await {
            Ok(stored) => match ctx.attach::<StoredFile>(stored) {
                Ok(()) => Outcome::Continue,
                Err(error) => Outcome::Abort(error),
            },
            Err(error) => Outcome::Abort(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::MockUploadStore;
    use crate::context::PathParams;
    use crate::ErrorKind;
    use bytes::Bytes;
    use http::{Method, Request};

    fn multipart_ctx(content_type: &str, body: &str) -> RequestContext {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/users/u/avatar")
            .header(CONTENT_TYPE, content_type)
            .body(Bytes::from(body.replace('\n', "\r\n")))
            .unwrap();
        RequestContext::new(request, PathParams::empty())
    }

    fn png_upload() -> RequestContext {
        multipart_ctx(
            "multipart/form-data; boundary=xYzZY",
            "--xYzZY\n\
             Content-Disposition: form-data; name=\"avatar\"; filename=\"keks.png\"\n\
             Content-Type: image/png\n\
             \n\
             PNGDATA\n\
             --xYzZY--\n",
        )
    }

    fn accepting_store() -> Arc<dyn UploadStore> {
        let mut store = MockUploadStore::new();
        store.expect_persist().returning(|name, mime, data| {
            Ok(StoredFile {
                stored_path: format!("/uploads/{name}"),
                original_name: name.to_owned(),
                size: data.len() as u64,
                mime: mime.to_owned(),
            })
        });
        Arc::new(store)
    }

    #[tokio::test]
    async fn persists_and_attaches_metadata() {
        let mw = UploadFile::new(accepting_store(), "avatar", UploadPolicy::default());
        let mut ctx = png_upload();
        assert!(matches!(mw.apply(&mut ctx).await, Outcome::Continue));

        let stored = ctx.attachment::<StoredFile>().expect("metadata attached");
        assert_eq!(stored.original_name, "keks.png");
        assert_eq!(stored.mime, "image/png");
        assert_eq!(stored.size, 7);
    }

    #[tokio::test]
    async fn missing_body_aborts_validation() {
        let mw = UploadFile::new(accepting_store(), "avatar", UploadPolicy::default());
        let request = Request::builder().method(Method::POST).uri("/x").body(Bytes::new()).unwrap();
        let mut ctx = RequestContext::new(request, PathParams::empty());
        let Outcome::Abort(err) = mw.apply(&mut ctx).await else { panic!("continued") };
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn oversized_file_aborts_before_persisting() {
        let mut store = MockUploadStore::new();
        store.expect_persist().never();
        let policy = UploadPolicy { max_size: 3, ..UploadPolicy::default() };
        let mw = UploadFile::new(Arc::new(store), "avatar", policy);
        let Outcome::Abort(err) = mw.apply(&mut png_upload()).await else { panic!("continued") };
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.message().contains("limit"));
    }

    #[tokio::test]
    async fn disallowed_mime_aborts_before_persisting() {
        let mut store = MockUploadStore::new();
        store.expect_persist().never();
        let policy = UploadPolicy { allowed: vec!["image/webp".into()], ..UploadPolicy::default() };
        let mw = UploadFile::new(Arc::new(store), "avatar", policy);
        let Outcome::Abort(err) = mw.apply(&mut png_upload()).await else { panic!("continued") };
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn wrong_field_name_aborts() {
        let mw = UploadFile::new(accepting_store(), "photo", UploadPolicy::default());
        let Outcome::Abort(err) = mw.apply(&mut png_upload()).await else { panic!("continued") };
        assert!(err.message().contains("photo"));
    }
}
