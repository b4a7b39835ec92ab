//! Full-pipeline scenarios: real router, real middleware, mocked services.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{Method, Request, Response, StatusCode};
use mockall::mock;
use mockall::predicate::eq;
use serde_json::{json, Value};

use portico_app::comment::{Comment, CommentService, CreateCommentDto};
use portico_app::offer::{CreateOfferDto, Offer, OfferService, UpdateOfferDto};
use portico_app::user::{CreateUserDto, User, UserService};
use portico_app::{application, Services};
use portico_web::capability::UploadStore;
use portico_web::middleware::UploadPolicy;
use portico_web::multipart::StoredFile;
use portico_web::{Dispatcher, HttpError, TokenCodec, TokenPayload};

const SECRET: &str = "integration-secret";
const OFFER_ID: &str = "cafebabe0000111122223333";
const USER_ID: &str = "feedface0000111122223333";
const OTHER_USER_ID: &str = "deadbeef0000111122223333";

mock! {
    Comments {}

    #[async_trait]
    impl CommentService for Comments {
        async fn create(&self, dto: CreateCommentDto, author_id: &str) -> Result<Comment, HttpError>;
    }
}

mock! {
    Offers {}

    #[async_trait]
    impl OfferService for Offers {
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
}

mock! {
    Users {}

    #[async_trait]
    impl UserService for Users {
        async fn create(&self, dto: CreateUserDto) -> Result<User, HttpError>;
        async fn find_by_email(&self, email: &str) -> Result<Option<User>, HttpError>;
        async fn verify(&self, email: &str, password: &str) -> Result<Option<User>, HttpError>;
        async fn set_avatar(&self, user_id: &str, path: &str) -> Result<(), HttpError>;
    }
}

mock! {
    Uploads {}

    #[async_trait]
    impl UploadStore for Uploads {
        async fn persist(
            &self,
            original_name: &str,
            mime: &str,
            data: Bytes,
        ) -> Result<StoredFile, HttpError>;
    }
}

fn app(comments: MockComments, offers: MockOffers, users: MockUsers, uploads: MockUploads) -> Dispatcher {
    application(Services {
        comments: Arc::new(comments),
        offers: Arc::new(offers),
        users: Arc::new(users),
        uploads: Arc::new(uploads),
        tokens: Arc::new(TokenCodec::new(SECRET)),
        avatar_policy: UploadPolicy::default(),
    })
    .expect("valid route table")
}

fn bearer_for(id: &str) -> String {
    let token = TokenCodec::new(SECRET).issue(&TokenPayload {
        id: id.to_owned(),
        email: "keks@six.cities".into(),
        name: "Keks".into(),
    });
    format!("Bearer {token}")
}

fn json_request(method: Method, uri: &str, bearer: Option<&str>, body: Value) -> Request<Bytes> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json");
    if let Some(credential) = bearer {
        builder = builder.header(AUTHORIZATION, credential);
    }
    builder.body(Bytes::from(serde_json::to_vec(&body).unwrap())).unwrap()
}

fn body_of(response: &Response<Bytes>) -> Value {
    serde_json::from_slice(response.body()).unwrap()
}

#[tokio::test]
async fn comment_on_existing_offer_is_created() {
    let mut comments = MockComments::new();
    comments.expect_create().returning(|dto, author| {
        Ok(Comment {
            id: "c1".into(),
            text: dto.text,
            offer_id: dto.offer_id,
            author_id: author.to_owned(),
        })
    });

    let mut offers = MockOffers::new();
    offers.expect_exists().with(eq(OFFER_ID)).returning(|_| Ok(true));
    offers.expect_inc_comment_count().with(eq(OFFER_ID)).times(1).returning(|_| Ok(()));

    let dispatcher = app(comments, offers, MockUsers::new(), MockUploads::new());
    let request = json_request(
        Method::POST,
        "/comments",
        Some(&bearer_for(USER_ID)),
        json!({ "offerId": OFFER_ID, "text": "very nice place" }),
    );

    let response = dispatcher.dispatch(request).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_of(&response);
    assert_eq!(body["text"], "very nice place");
    assert_eq!(body["offerId"], OFFER_ID);
    assert_eq!(body["authorId"], USER_ID);
}

#[tokio::test]
async fn comment_on_missing_offer_is_not_found() {
    let mut comments = MockComments::new();
    comments.expect_create().never();

    let mut offers = MockOffers::new();
    offers.expect_exists().returning(|_| Ok(false));
    offers.expect_inc_comment_count().never();

    let dispatcher = app(comments, offers, MockUsers::new(), MockUploads::new());
    let request = json_request(
        Method::POST,
        "/comments",
        Some(&bearer_for(USER_ID)),
        json!({ "offerId": OFFER_ID, "text": "very nice place" }),
    );

    let response = dispatcher.dispatch(request).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_of(&response);
    assert_eq!(body["statusCode"], 404);
    assert_eq!(body["errorType"], "NotFound");
}

#[tokio::test]
async fn private_route_without_credentials_is_unauthorized() {
    let mut comments = MockComments::new();
    comments.expect_create().never();
    let mut offers = MockOffers::new();
    offers.expect_exists().never();

    let dispatcher = app(comments, offers, MockUsers::new(), MockUploads::new());
    let request = json_request(
        Method::POST,
        "/comments",
        None,
        json!({ "offerId": OFFER_ID, "text": "very nice place" }),
    );

    let response = dispatcher.dispatch(request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_of(&response)["errorType"], "Unauthorized");
}

#[tokio::test]
async fn invalid_dto_never_reaches_the_services() {
    let mut comments = MockComments::new();
    comments.expect_create().never();
    let mut offers = MockOffers::new();
    offers.expect_exists().never();

    let dispatcher = app(comments, offers, MockUsers::new(), MockUploads::new());
    let request = json_request(
        Method::POST,
        "/comments",
        Some(&bearer_for(USER_ID)),
        json!({ "offerId": OFFER_ID }),
    );

    let response = dispatcher.dispatch(request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_of(&response);
    assert_eq!(body["errorType"], "Validation");
    assert!(body["details"].to_string().contains("text"));
}

#[tokio::test]
async fn updating_a_foreign_offer_is_forbidden() {
    let mut offers = MockOffers::new();
    offers.expect_exists().with(eq(OFFER_ID)).returning(|_| Ok(true));
    offers.expect_owner_of().with(eq(OFFER_ID)).returning(|_| Ok(Some(USER_ID.to_owned())));
    offers.expect_update().never();

    let dispatcher = app(MockComments::new(), offers, MockUsers::new(), MockUploads::new());
    let request = json_request(
        Method::PUT,
        &format!("/offers/{OFFER_ID}"),
        Some(&bearer_for(OTHER_USER_ID)),
        json!({ "price": 4200 }),
    );

    let response = dispatcher.dispatch(request).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_of(&response)["errorType"], "Forbidden");
}

#[tokio::test]
async fn malformed_object_id_is_rejected_before_lookups() {
    let mut offers = MockOffers::new();
    offers.expect_exists().never();
    offers.expect_find_by_id().never();

    let dispatcher = app(MockComments::new(), offers, MockUsers::new(), MockUploads::new());
    let request = Request::builder()
        .method(Method::GET)
        .uri("/offers/not-an-id")
        .body(Bytes::new())
        .unwrap();

    let response = dispatcher.dispatch(request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_of(&response)["errorType"], "Validation");
}

#[tokio::test]
async fn login_issues_a_token_that_opens_private_routes() {
    let user = User {
        id: USER_ID.into(),
        name: "Keks".into(),
        email: "keks@six.cities".into(),
        avatar_path: None,
    };

    let mut users = MockUsers::new();
    let found = user.clone();
    users
        .expect_verify()
        .with(eq("keks@six.cities"), eq("qwerty"))
        .returning(move |_, _| Ok(Some(found.clone())));

    let mut comments = MockComments::new();
    comments.expect_create().returning(|dto, author| {
        Ok(Comment {
            id: "c1".into(),
            text: dto.text,
            offer_id: dto.offer_id,
            author_id: author.to_owned(),
        })
    });
    let mut offers = MockOffers::new();
    offers.expect_exists().returning(|_| Ok(true));
    offers.expect_inc_comment_count().returning(|_| Ok(()));

    let dispatcher = app(comments, offers, users, MockUploads::new());

    let login = json_request(
        Method::POST,
        "/users/login",
        None,
        json!({ "email": "keks@six.cities", "password": "qwerty" }),
    );
    let response = dispatcher.dispatch(login).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_of(&response);
    assert_eq!(body["user"]["email"], "keks@six.cities");
    assert!(body["user"].get("password").is_none());
    let token = body["token"].as_str().unwrap().to_owned();

    let comment = json_request(
        Method::POST,
        "/comments",
        Some(&format!("Bearer {token}")),
        json!({ "offerId": OFFER_ID, "text": "came back twice" }),
    );
    let response = dispatcher.dispatch(comment).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_of(&response)["authorId"], USER_ID);
}

#[tokio::test]
async fn register_with_taken_email_is_a_conflict() {
    let mut users = MockUsers::new();
    users.expect_find_by_email().with(eq("keks@six.cities")).returning(|email| {
        Ok(Some(User {
            id: USER_ID.into(),
            name: "Keks".into(),
            email: email.to_owned(),
            avatar_path: None,
        }))
    });
    users.expect_create().never();

    let dispatcher = app(MockComments::new(), MockOffers::new(), users, MockUploads::new());
    let request = json_request(
        Method::POST,
        "/users/register",
        None,
        json!({ "name": "Keks", "email": "keks@six.cities", "password": "qwerty" }),
    );

    let response = dispatcher.dispatch(request).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_of(&response)["errorType"], "Conflict");
}

#[tokio::test]
async fn avatar_upload_stores_the_file_and_reports_its_path() {
    let mut users = MockUsers::new();
    users
        .expect_set_avatar()
        .with(eq(USER_ID), eq("/uploads/keks.png"))
        .times(1)
        .returning(|_, _| Ok(()));

    let mut uploads = MockUploads::new();
    uploads.expect_persist().returning(|name, mime, data| {
        Ok(StoredFile {
            stored_path: format!("/uploads/{name}"),
            original_name: name.to_owned(),
            size: data.len() as u64,
            mime: mime.to_owned(),
        })
    });

    let dispatcher = app(MockComments::new(), MockOffers::new(), users, uploads);

    let body = "--xYzZY\r\n\
                Content-Disposition: form-data; name=\"avatar\"; filename=\"keks.png\"\r\n\
                Content-Type: image/png\r\n\
                \r\n\
                PNGDATA\r\n\
                --xYzZY--\r\n";
    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("/users/{USER_ID}/avatar"))
        .header(AUTHORIZATION, bearer_for(USER_ID))
        .header(CONTENT_TYPE, "multipart/form-data; boundary=xYzZY")
        .body(Bytes::from(body))
        .unwrap();

    let response = dispatcher.dispatch(request).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_of(&response)["filepath"], "/uploads/keks.png");
}

#[tokio::test]
async fn avatar_upload_for_another_user_is_forbidden() {
    let mut users = MockUsers::new();
    users.expect_set_avatar().never();

    let mut uploads = MockUploads::new();
    uploads.expect_persist().returning(|name, mime, data| {
        Ok(StoredFile {
            stored_path: format!("/uploads/{name}"),
            original_name: name.to_owned(),
            size: data.len() as u64,
            mime: mime.to_owned(),
        })
    });

    let dispatcher = app(MockComments::new(), MockOffers::new(), users, uploads);

    let body = "--xYzZY\r\n\
                Content-Disposition: form-data; name=\"avatar\"; filename=\"keks.png\"\r\n\
                Content-Type: image/png\r\n\
                \r\n\
                PNGDATA\r\n\
                --xYzZY--\r\n";
    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("/users/{USER_ID}/avatar"))
        .header(AUTHORIZATION, bearer_for(OTHER_USER_ID))
        .header(CONTENT_TYPE, "multipart/form-data; boundary=xYzZY")
        .body(Bytes::from(body))
        .unwrap();

    let response = dispatcher.dispatch(request).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
