use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;

use portico_web::{ConfigError, DtoSchema};

use super::User;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserDto {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginDto {
    pub email: String,
    pub password: String,
}

const EMAIL_PATTERN: &str = "^[^@\\s]+@[^@\\s]+$";

pub fn create_user_schema() -> Result<Arc<DtoSchema>, ConfigError> {
    let schema = json!({
        "type": "object",
        "required": ["name", "email", "password"],
        "properties": {
            "name": { "type": "string", "minLength": 1, "maxLength": 15 },
            "email": { "type": "string", "pattern": EMAIL_PATTERN },
            "password": { "type": "string", "minLength": 6, "maxLength": 12 }
        },
        "additionalProperties": false
    });
    DtoSchema::compile("CreateUserDto", &schema).map(Arc::new)
}

pub fn login_schema() -> Result<Arc<DtoSchema>, ConfigError> {
    let schema = json!({
        "type": "object",
        "required": ["email", "password"],
        "properties": {
            "email": { "type": "string", "pattern": EMAIL_PATTERN },
            "password": { "type": "string" }
        },
        "additionalProperties": false
    });
    DtoSchema::compile("LoginDto", &schema).map(Arc::new)
}

/// Client-facing representation of a user. No password material, ever.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRdo {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_path: Option<String>,
}

impl From<User> for UserRdo {
    fn from(user: User) -> Self {
        Self { id: user.id, name: user.name, email: user.email, avatar_path: user.avatar_path }
    }
}

/// Login response: the bearer token plus the public user fields.
#[derive(Debug, Clone, Serialize)]
pub struct LoggedInRdo {
    pub token: String,
    pub user: UserRdo,
}
