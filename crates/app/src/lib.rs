//! # portico-app
//!
//! The rental-offers REST surface, assembled from [`portico_web`] parts.
//!
//! Controllers group routes per entity and receive every collaborator
//! (domain services, the token codec, the upload store) explicitly, so the
//! whole wiring is visible in [`application`] and each piece can be swapped
//! for a mock in tests. Persistence itself stays behind the service traits;
//! this crate knows nothing about how records are stored.

pub mod comment;
pub mod offer;
pub mod user;

use std::sync::Arc;

use tracing::info;

use portico_web::capability::{TokenDecoder, UploadStore};
use portico_web::middleware::{ParseToken, UploadPolicy};
use portico_web::{ConfigError, Dispatcher, Router, TokenCodec};

use crate::comment::CommentService;
use crate::offer::OfferService;
use crate::user::UserService;

/// Everything the application needs from the outside world.
pub struct Services {
    pub comments: Arc<dyn CommentService>,
    pub offers: Arc<dyn OfferService>,
    pub users: Arc<dyn UserService>,
    pub uploads: Arc<dyn UploadStore>,
    pub tokens: Arc<TokenCodec>,
    pub avatar_policy: UploadPolicy,
}

/// Builds the complete dispatcher: every controller mounted, credentials
/// parsed application-wide before any route middleware runs.
pub fn application(services: Services) -> Result<Dispatcher, ConfigError> {
    let Services { comments, offers, users, uploads, tokens, avatar_policy } = services;

    let decoder: Arc<dyn TokenDecoder> = Arc::clone(&tokens) as Arc<dyn TokenDecoder>;
    let router = Router::builder()
        .with_global_middleware(Arc::new(ParseToken::new(decoder)))
        .mount(comment::controller(comments, Arc::clone(&offers))?)
        .mount(offer::controller(offers)?)
        .mount(user::controller(users, uploads, tokens, avatar_policy)?)
        .build()?;

    info!(routes = router.len(), "application configured");
    Ok(Dispatcher::new(router))
}
