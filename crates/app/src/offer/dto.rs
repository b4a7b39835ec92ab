use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;

use portico_web::{ConfigError, DtoSchema};

use super::Offer;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOfferDto {
    pub title: String,
    pub description: String,
    pub city: String,
    pub price: u32,
    #[serde(default)]
    pub is_premium: bool,
}

/// All fields optional; absent means "leave unchanged".
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOfferDto {
    pub title: Option<String>,
    pub description: Option<String>,
    pub city: Option<String>,
    pub price: Option<u32>,
    pub is_premium: Option<bool>,
}

fn offer_properties() -> serde_json::Value {
    json!({
        "title": { "type": "string", "minLength": 10, "maxLength": 100 },
        "description": { "type": "string", "minLength": 20, "maxLength": 1024 },
        "city": { "type": "string", "minLength": 1 },
        "price": { "type": "integer", "minimum": 100, "maximum": 100_000 },
        "isPremium": { "type": "boolean" }
    })
}

pub fn create_offer_schema() -> Result<Arc<DtoSchema>, ConfigError> {
    let schema = json!({
        "type": "object",
        "required": ["title", "description", "city", "price"],
        "properties": offer_properties(),
        "additionalProperties": false
    });
    DtoSchema::compile("CreateOfferDto", &schema).map(Arc::new)
}

pub fn update_offer_schema() -> Result<Arc<DtoSchema>, ConfigError> {
    let schema = json!({
        "type": "object",
        "properties": offer_properties(),
        "additionalProperties": false
    });
    DtoSchema::compile("UpdateOfferDto", &schema).map(Arc::new)
}

/// Client-facing representation of an offer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferRdo {
    pub id: String,
    pub title: String,
    pub description: String,
    pub city: String,
    pub price: u32,
    pub is_premium: bool,
    pub author_id: String,
    pub comment_count: u32,
}

impl From<Offer> for OfferRdo {
    fn from(offer: Offer) -> Self {
        Self {
            id: offer.id,
            title: offer.title,
            description: offer.description,
            city: offer.city,
            price: offer.price,
            is_premium: offer.is_premium,
            author_id: offer.author_id,
            comment_count: offer.comment_count,
        }
    }
}
