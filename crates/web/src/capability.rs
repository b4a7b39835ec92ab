//! Collaborator capabilities consumed by the built-in middleware.
//!
//! The pipeline never talks to storage, crypto or the filesystem directly.
//! Each middleware that needs the outside world declares a narrow trait here
//! and receives an implementation at construction time, which keeps the
//! dependency visible in the signature and trivially mockable in tests.
//!
//! All implementations are assumed safe under concurrent invocation; the
//! pipeline itself holds no shared mutable state and takes no locks.

use bytes::Bytes;

use crate::error::HttpError;
use crate::multipart::StoredFile;
use crate::token::TokenPayload;

/// `exists(id) -> bool` over some collection of domain records.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait DocumentLookup: Send + Sync {
    async fn exists(&self, id: &str) -> Result<bool, HttpError>;
}

/// Resolves the owner id of a record, `None` when the record is absent.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait OwnershipLookup: Send + Sync {
    async fn owner_of(&self, id: &str) -> Result<Option<String>, HttpError>;
}

/// Verifies a bearer credential and returns its payload, `None` when the
/// credential is invalid. Invalidity is not an error at this layer.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait TokenDecoder: Send + Sync {
    async fn decode(&self, token: &str) -> Option<TokenPayload>;
}

/// Persists an uploaded file's bytes and reports where they landed.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait UploadStore: Send + Sync {
    async fn persist(
        &self,
        original_name: &str,
        mime: &str,
        data: Bytes,
    ) -> Result<StoredFile, HttpError>;
}
