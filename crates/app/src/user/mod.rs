//! Users: registration, login and avatar upload.

mod dto;

pub use dto::{create_user_schema, login_schema, CreateUserDto, LoggedInRdo, LoginDto, UserRdo};

use std::sync::Arc;

use async_trait::async_trait;
use http::Method;
use portico_web::capability::UploadStore;
use portico_web::middleware::{
    Middleware, PrivateRoute, UploadFile, UploadPolicy, ValidateDto, ValidateObjectId,
};
use portico_web::multipart::StoredFile;
use portico_web::{
    handler_fn, respond, ConfigError, Controller, HttpError, TokenCodec, TokenPayload,
};

const ORIGIN: &str = "UserController";

/// A stored user. The password hash never leaves the service layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar_path: Option<String>,
}

#[async_trait]
pub trait UserService: Send + Sync {
    async fn create(&self, dto: CreateUserDto) -> Result<User, HttpError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, HttpError>;
    /// Checks credentials; `None` means the pair does not match any user.
    async fn verify(&self, email: &str, password: &str) -> Result<Option<User>, HttpError>;
    async fn set_avatar(&self, user_id: &str, path: &str) -> Result<(), HttpError>;
}

pub fn controller(
    users: Arc<dyn UserService>,
    uploads: Arc<dyn UploadStore>,
    tokens: Arc<TokenCodec>,
    avatar_policy: UploadPolicy,
) -> Result<Controller, ConfigError> {
    let register_schema = create_user_schema()?;
    let login_schema = login_schema()?;

    let register = {
        let users = Arc::clone(&users);
        handler_fn(move |ctx| {
            let users = Arc::clone(&users);
            async move {
                let dto: CreateUserDto = ctx.json()?;
                if users.find_by_email(&dto.email).await?.is_some() {
                    return Err(HttpError::conflict(
                        format!("user with email {} already exists", dto.email),
                        ORIGIN,
                    ));
                }
                let user = users.create(dto).await?;
                respond::created(&UserRdo::from(user))
            }
        })
    };

    let login = {
        let users = Arc::clone(&users);
        let tokens = Arc::clone(&tokens);
        handler_fn(move |ctx| {
            let users = Arc::clone(&users);
            let tokens = Arc::clone(&tokens);
            async move {
                let dto: LoginDto = ctx.json()?;
                let Some(user) = users.verify(&dto.email, &dto.password).await? else {
                    return Err(HttpError::unauthorized("invalid email or password", ORIGIN));
                };
                let token = tokens.issue(&TokenPayload {
                    id: user.id.clone(),
                    email: user.email.clone(),
                    name: user.name.clone(),
                });
                respond::ok(&LoggedInRdo { token, user: UserRdo::from(user) })
            }
        })
    };

    let upload_avatar = {
        let users = Arc::clone(&users);
        handler_fn(move |ctx| {
            let users = Arc::clone(&users);
            async move {
                let principal = ctx
                    .attachment::<TokenPayload>()
                    .ok_or_else(|| HttpError::unauthorized("authorization required", ORIGIN))?;
                let user_id = ctx
                    .param("userId")
                    .ok_or_else(|| HttpError::validation("path parameter `userId` is missing", ORIGIN))?;
                if principal.id != user_id {
                    return Err(HttpError::forbidden("cannot change another user's avatar", ORIGIN));
                }
                let stored = ctx
                    .attachment::<StoredFile>()
                    .ok_or_else(|| HttpError::internal("upload metadata missing", ORIGIN))?;
                users.set_avatar(user_id, &stored.stored_path).await?;
                respond::created(&serde_json::json!({ "filepath": stored.stored_path }))
            }
        })
    };

    let avatar_middleware: Vec<Arc<dyn Middleware>> = vec![
        Arc::new(PrivateRoute),
        Arc::new(ValidateObjectId::new("userId")),
        Arc::new(UploadFile::new(uploads, "avatar", avatar_policy)),
    ];

    Ok(Controller::new("/users")
        .route(
            Method::POST,
            "/register",
            vec![Arc::new(ValidateDto::new(register_schema))],
            register,
        )
        .route(Method::POST, "/login", vec![Arc::new(ValidateDto::new(login_schema))], login)
        .route(Method::POST, "/{userId}/avatar", avatar_middleware, upload_avatar))
}
