//! Comments left on offers.

mod dto;

pub use dto::{create_comment_schema, CommentRdo, CreateCommentDto};

use std::sync::Arc;

use async_trait::async_trait;
use portico_web::middleware::{Middleware, PrivateRoute, ValidateDto};
use portico_web::{handler_fn, respond, ConfigError, Controller, HttpError, TokenPayload};

use crate::offer::OfferService;

const ORIGIN: &str = "CommentController";

/// A stored comment. `author_id` comes from the authenticated principal,
/// never from the request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: String,
    pub text: String,
    pub offer_id: String,
    pub author_id: String,
}

#[async_trait]
pub trait CommentService: Send + Sync {
    async fn create(&self, dto: CreateCommentDto, author_id: &str) -> Result<Comment, HttpError>;
}

/// `POST /comments`: private, validated, and the referenced offer must
/// exist. Creating a comment also bumps the offer's comment counter.
pub fn controller(
    comments: Arc<dyn CommentService>,
    offers: Arc<dyn OfferService>,
) -> Result<Controller, ConfigError> {
    let schema = create_comment_schema()?;

    let create = {
        let comments = Arc::clone(&comments);
        let offers = Arc::clone(&offers);
        handler_fn(move |ctx| {
            let comments = Arc::clone(&comments);
            let offers = Arc::clone(&offers);
            async move {
                let principal = ctx
                    .attachment::<TokenPayload>()
                    .ok_or_else(|| HttpError::unauthorized("authorization required", ORIGIN))?;
                let dto: CreateCommentDto = ctx.json()?;

                if !offers.exists(&dto.offer_id).await? {
                    return Err(HttpError::not_found(
                        format!("offer with id {} not found", dto.offer_id),
                        ORIGIN,
                    ));
                }

                let offer_id = dto.offer_id.clone();
                let comment = comments.create(dto, &principal.id).await?;
                offers.inc_comment_count(&offer_id).await?;
                respond::created(&CommentRdo::from(comment))
            }
        })
    };

    let middleware: Vec<Arc<dyn Middleware>> =
        vec![Arc::new(PrivateRoute), Arc::new(ValidateDto::new(schema))];

    Ok(Controller::new("/comments").route(http::Method::POST, "/", middleware, create))
}
