use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;

use portico_web::{ConfigError, DtoSchema};

use super::Comment;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentDto {
    pub offer_id: String,
    pub text: String,
}

/// Declared shape for `CreateCommentDto`; compiled once per controller.
pub fn create_comment_schema() -> Result<Arc<DtoSchema>, ConfigError> {
    let schema = json!({
        "type": "object",
        "required": ["offerId", "text"],
        "properties": {
            "offerId": { "type": "string", "pattern": "^[0-9a-f]{24}$" },
            "text": { "type": "string", "minLength": 5, "maxLength": 1024 }
        },
        "additionalProperties": false
    });
    DtoSchema::compile("CreateCommentDto", &schema).map(Arc::new)
}

/// Client-facing representation of a comment.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRdo {
    pub id: String,
    pub text: String,
    pub offer_id: String,
    pub author_id: String,
}

impl From<Comment> for CommentRdo {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            text: comment.text,
            offer_id: comment.offer_id,
            author_id: comment.author_id,
        }
    }
}
