//! Rental offers.

mod dto;

pub use dto::{create_offer_schema, update_offer_schema, CreateOfferDto, OfferRdo, UpdateOfferDto};

use std::sync::Arc;

use async_trait::async_trait;
use http::Method;
use portico_web::capability::{DocumentLookup, OwnershipLookup};
use portico_web::middleware::{
    Authorship, DocumentExists, Middleware, PrivateRoute, ValidateDto, ValidateObjectId,
};
use portico_web::{handler_fn, respond, ConfigError, Controller, HttpError, TokenPayload};

const ORIGIN: &str = "OfferController";
const DEFAULT_OFFER_COUNT: usize = 60;

/// A stored offer.
#[derive(Debug, Clone, PartialEq)]
pub struct Offer {
    pub id: String,
    pub title: String,
    pub description: String,
    pub city: String,
    pub price: u32,
    pub is_premium: bool,
    pub author_id: String,
    pub comment_count: u32,
}

#[async_trait]
pub trait OfferService: Send + Sync {
    async fn find(&self, limit: usize) -> Result<Vec<Offer>, HttpError>;
    async fn find_premium_by_city(&self, city: &str) -> Result<Vec<Offer>, HttpError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Offer>, HttpError>;
    async fn create(&self, dto: CreateOfferDto, author_id: &str) -> Result<Offer, HttpError>;
    async fn update(&self, id: &str, dto: UpdateOfferDto) -> Result<Offer, HttpError>;
    async fn delete(&self, id: &str) -> Result<(), HttpError>;
    async fn inc_comment_count(&self, id: &str) -> Result<(), HttpError>;
    async fn exists(&self, id: &str) -> Result<bool, HttpError>;
    async fn owner_of(&self, id: &str) -> Result<Option<String>, HttpError>;
}

/// Adapter exposing only the existence check to `DocumentExists`.
pub struct OfferExistence(pub Arc<dyn OfferService>);

#[async_trait]
impl DocumentLookup for OfferExistence {
    async fn exists(&self, id: &str) -> Result<bool, HttpError> {
        self.0.exists(id).await
    }
}

/// Adapter exposing only the owner lookup to `Authorship`.
pub struct OfferOwnership(pub Arc<dyn OfferService>);

#[async_trait]
impl OwnershipLookup for OfferOwnership {
    async fn owner_of(&self, id: &str) -> Result<Option<String>, HttpError> {
        self.0.owner_of(id).await
    }
}

fn principal(ctx: &portico_web::RequestContext) -> Result<&TokenPayload, HttpError> {
    ctx.attachment::<TokenPayload>()
        .ok_or_else(|| HttpError::unauthorized("authorization required", ORIGIN))
}

fn offer_id(ctx: &portico_web::RequestContext) -> Result<String, HttpError> {
    ctx.param("offerId")
        .map(str::to_owned)
        .ok_or_else(|| HttpError::validation("path parameter `offerId` is missing", ORIGIN))
}

pub fn controller(offers: Arc<dyn OfferService>) -> Result<Controller, ConfigError> {
    let create_schema = create_offer_schema()?;
    let update_schema = update_offer_schema()?;
    let existence: Arc<dyn DocumentLookup> = Arc::new(OfferExistence(Arc::clone(&offers)));
    let ownership: Arc<dyn OwnershipLookup> = Arc::new(OfferOwnership(Arc::clone(&offers)));

    let list = {
        let offers = Arc::clone(&offers);
        handler_fn(move |ctx| {
            let offers = Arc::clone(&offers);
            async move {
                let limit = ctx
                    .query("limit")
                    .and_then(|raw| raw.parse().ok())
                    .unwrap_or(DEFAULT_OFFER_COUNT);
                let found = offers.find(limit).await?;
                respond::ok(&found.into_iter().map(OfferRdo::from).collect::<Vec<_>>())
            }
        })
    };

    let premium = {
        let offers = Arc::clone(&offers);
        handler_fn(move |ctx| {
            let offers = Arc::clone(&offers);
            async move {
                let Some(city) = ctx.query("city").map(str::to_owned) else {
                    return Err(HttpError::validation("query parameter `city` is required", ORIGIN));
                };
                let found = offers.find_premium_by_city(&city).await?;
                respond::ok(&found.into_iter().map(OfferRdo::from).collect::<Vec<_>>())
            }
        })
    };

    let show = {
        let offers = Arc::clone(&offers);
        handler_fn(move |ctx| {
            let offers = Arc::clone(&offers);
            async move {
                let id = offer_id(&ctx)?;
                // DocumentExists ran just before us; a vanished record here is
                // a storage inconsistency, not a client mistake
                let offer = offers
                    .find_by_id(&id)
                    .await?
                    .ok_or_else(|| HttpError::not_found(format!("offer with id {id} not found"), ORIGIN))?;
                respond::ok(&OfferRdo::from(offer))
            }
        })
    };

    let create = {
        let offers = Arc::clone(&offers);
        handler_fn(move |ctx| {
            let offers = Arc::clone(&offers);
            async move {
                let author = principal(&ctx)?.id.clone();
                let dto: CreateOfferDto = ctx.json()?;
                let offer = offers.create(dto, &author).await?;
                respond::created(&OfferRdo::from(offer))
            }
        })
    };

    let update = {
        let offers = Arc::clone(&offers);
        handler_fn(move |ctx| {
            let offers = Arc::clone(&offers);
            async move {
                let id = offer_id(&ctx)?;
                let dto: UpdateOfferDto = ctx.json()?;
                let offer = offers.update(&id, dto).await?;
                respond::ok(&OfferRdo::from(offer))
            }
        })
    };

    let delete = {
        let offers = Arc::clone(&offers);
        handler_fn(move |ctx| {
            let offers = Arc::clone(&offers);
            async move {
                let id = offer_id(&ctx)?;
                offers.delete(&id).await?;
                respond::no_content()
            }
        })
    };

    let guard_exists =
        || -> Arc<dyn Middleware> { Arc::new(DocumentExists::new(Arc::clone(&existence), "offer", "offerId")) };
    let guard_owner =
        || -> Arc<dyn Middleware> { Arc::new(Authorship::new(Arc::clone(&ownership), "offer", "offerId")) };

    Ok(Controller::new("/offers")
        .route(Method::GET, "/", vec![], list)
        .route(Method::GET, "/premium", vec![], premium)
        .route(
            Method::GET,
            "/{offerId}",
            vec![Arc::new(ValidateObjectId::new("offerId")), guard_exists()],
            show,
        )
        .route(
            Method::POST,
            "/",
            vec![Arc::new(PrivateRoute), Arc::new(ValidateDto::new(create_schema))],
            create,
        )
        .route(
            Method::PUT,
            "/{offerId}",
            vec![
                Arc::new(PrivateRoute),
                Arc::new(ValidateObjectId::new("offerId")),
                Arc::new(ValidateDto::new(update_schema)),
                guard_exists(),
                guard_owner(),
            ],
            update,
        )
        .route(
            Method::DELETE,
            "/{offerId}",
            vec![
                Arc::new(PrivateRoute),
                Arc::new(ValidateObjectId::new("offerId")),
                guard_exists(),
                guard_owner(),
            ],
            delete,
        ))
}
