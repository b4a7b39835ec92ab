//! Walks the whole API with in-memory services: register, login, publish an
//! offer, comment on it, and watch a forbidden update bounce.
//!
//! ```sh
//! PORTICO_TOKEN_SECRET=demo cargo run -p portico-app --example rental_api
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{Method, Request};
use serde_json::json;

use portico_app::comment::{Comment, CommentService, CreateCommentDto};
use portico_app::offer::{CreateOfferDto, Offer, OfferService, UpdateOfferDto};
use portico_app::user::{CreateUserDto, User, UserService};
use portico_app::{application, Services};
use portico_web::capability::UploadStore;
use portico_web::middleware::UploadPolicy;
use portico_web::multipart::StoredFile;
use portico_web::{Dispatcher, HttpError, TokenCodec};

fn next_id() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    format!("{:024x}", COUNTER.fetch_add(1, Ordering::Relaxed))
}

#[derive(Default)]
struct MemoryUsers {
    records: Mutex<Vec<(User, String)>>,
}

#[async_trait]
impl UserService for MemoryUsers {
    async fn create(&self, dto: CreateUserDto) -> Result<User, HttpError> {
        let user = User { id: next_id(), name: dto.name, email: dto.email, avatar_path: None };
        self.records.lock().unwrap().push((user.clone(), dto.password));
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, HttpError> {
        Ok(self.records.lock().unwrap().iter().find(|(u, _)| u.email == email).map(|(u, _)| u.clone()))
    }

    async fn verify(&self, email: &str, password: &str) -> Result<Option<User>, HttpError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|(u, stored)| u.email == email && stored == password)
            .map(|(u, _)| u.clone()))
    }

    async fn set_avatar(&self, user_id: &str, path: &str) -> Result<(), HttpError> {
        let mut records = self.records.lock().unwrap();
        if let Some((user, _)) = records.iter_mut().find(|(u, _)| u.id == user_id) {
            user.avatar_path = Some(path.to_owned());
        }
        Ok(())
    }
}

#[derive(Default)]
struct MemoryOffers {
    records: Mutex<Vec<Offer>>,
}

#[async_trait]
impl OfferService for MemoryOffers {
    async fn find(&self, limit: usize) -> Result<Vec<Offer>, HttpError> {
        Ok(self.records.lock().unwrap().iter().take(limit).cloned().collect())
    }

    async fn find_premium_by_city(&self, city: &str) -> Result<Vec<Offer>, HttpError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|o| o.is_premium && o.city == city)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Offer>, HttpError> {
        Ok(self.records.lock().unwrap().iter().find(|o| o.id == id).cloned())
    }

    async fn create(&self, dto: CreateOfferDto, author_id: &str) -> Result<Offer, HttpError> {
        let offer = Offer {
            id: next_id(),
            title: dto.title,
            description: dto.description,
            city: dto.city,
            price: dto.price,
            is_premium: dto.is_premium,
            author_id: author_id.to_owned(),
            comment_count: 0,
        };
        self.records.lock().unwrap().push(offer.clone());
        Ok(offer)
    }

    async fn update(&self, id: &str, dto: UpdateOfferDto) -> Result<Offer, HttpError> {
        let mut records = self.records.lock().unwrap();
        let offer = records
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| HttpError::not_found(format!("offer with id {id} not found"), "MemoryOffers"))?;
        if let Some(title) = dto.title {
            offer.title = title;
        }
        if let Some(description) = dto.description {
            offer.description = description;
        }
        if let Some(city) = dto.city {
            offer.city = city;
        }
        if let Some(price) = dto.price {
            offer.price = price;
        }
        if let Some(is_premium) = dto.is_premium {
            offer.is_premium = is_premium;
        }
        Ok(offer.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), HttpError> {
        self.records.lock().unwrap().retain(|o| o.id != id);
        Ok(())
    }

    async fn inc_comment_count(&self, id: &str) -> Result<(), HttpError> {
        if let Some(offer) = self.records.lock().unwrap().iter_mut().find(|o| o.id == id) {
            offer.comment_count += 1;
        }
        Ok(())
    }

    async fn exists(&self, id: &str) -> Result<bool, HttpError> {
        Ok(self.records.lock().unwrap().iter().any(|o| o.id == id))
    }

    async fn owner_of(&self, id: &str) -> Result<Option<String>, HttpError> {
        Ok(self.records.lock().unwrap().iter().find(|o| o.id == id).map(|o| o.author_id.clone()))
    }
}

#[derive(Default)]
struct MemoryComments;

#[async_trait]
impl CommentService for MemoryComments {
    async fn create(&self, dto: CreateCommentDto, author_id: &str) -> Result<Comment, HttpError> {
        Ok(Comment {
            id: next_id(),
            text: dto.text,
            offer_id: dto.offer_id,
            author_id: author_id.to_owned(),
        })
    }
}

struct DiscardUploads;

#[async_trait]
impl UploadStore for DiscardUploads {
    async fn persist(&self, original_name: &str, mime: &str, data: Bytes) -> Result<StoredFile, HttpError> {
        Ok(StoredFile {
            stored_path: format!("/uploads/{original_name}"),
            original_name: original_name.to_owned(),
            size: data.len() as u64,
            mime: mime.to_owned(),
        })
    }
}

async fn show(dispatcher: &Dispatcher, request: Request<Bytes>) -> serde_json::Value {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let response = dispatcher.dispatch(request).await;
    let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap_or_default();
    println!("{method} {path} -> {}\n{body:#}\n", response.status());
    body
}

fn json_request(method: Method, uri: &str, bearer: Option<&str>, body: serde_json::Value) -> Request<Bytes> {
    let mut builder = Request::builder().method(method).uri(uri).header(CONTENT_TYPE, "application/json");
    if let Some(token) = bearer {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Bytes::from(serde_json::to_vec(&body).unwrap())).unwrap()
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

    let secret = std::env::var("PORTICO_TOKEN_SECRET").unwrap_or_else(|_| "demo-secret".to_owned());
    let dispatcher = application(Services {
        comments: Arc::new(MemoryComments),
        offers: Arc::new(MemoryOffers::default()),
        users: Arc::new(MemoryUsers::default()),
        uploads: Arc::new(DiscardUploads),
        tokens: Arc::new(TokenCodec::new(secret)),
        avatar_policy: UploadPolicy::default(),
    })
    .expect("route table is valid");

    show(
        &dispatcher,
        json_request(
            Method::POST,
            "/users/register",
            None,
            json!({ "name": "Keks", "email": "keks@six.cities", "password": "qwerty" }),
        ),
    )
    .await;

    let login = show(
        &dispatcher,
        json_request(
            Method::POST,
            "/users/login",
            None,
            json!({ "email": "keks@six.cities", "password": "qwerty" }),
        ),
    )
    .await;
    let token = login["token"].as_str().expect("login succeeded").to_owned();

    let offer = show(
        &dispatcher,
        json_request(
            Method::POST,
            "/offers",
            Some(&token),
            json!({
                "title": "Nice cozy loft downtown",
                "description": "A bright loft a short walk from the harbour.",
                "city": "Amsterdam",
                "price": 1200,
                "isPremium": true
            }),
        ),
    )
    .await;
    let offer_id = offer["id"].as_str().expect("offer created").to_owned();

    show(
        &dispatcher,
        json_request(
            Method::POST,
            "/comments",
            Some(&token),
            json!({ "offerId": offer_id, "text": "Stayed here last spring, loved it." }),
        ),
    )
    .await;

    show(
        &dispatcher,
        json_request(Method::GET, &format!("/offers/{offer_id}"), None, json!({})),
    )
    .await;

    // Another account trying to edit someone else's offer.
    show(
        &dispatcher,
        json_request(
            Method::POST,
            "/users/register",
            None,
            json!({ "name": "Mallory", "email": "mallory@six.cities", "password": "hunter2" }),
        ),
    )
    .await;
    let login = show(
        &dispatcher,
        json_request(
            Method::POST,
            "/users/login",
            None,
            json!({ "email": "mallory@six.cities", "password": "hunter2" }),
        ),
    )
    .await;
    let foreign_token = login["token"].as_str().expect("login succeeded").to_owned();

    show(
        &dispatcher,
        json_request(
            Method::PUT,
            &format!("/offers/{offer_id}"),
            Some(&foreign_token),
            json!({ "price": 100 }),
        ),
    )
    .await;
}
