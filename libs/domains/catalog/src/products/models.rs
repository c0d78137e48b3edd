use advanced_results::{CollectionSchema, FieldKind, Relation};
use axum_helpers::extractors::form_values::optional_number;
use chrono::{DateTime, Utc};
use mongodb::bson::{Bson, Document, oid::ObjectId, serde_helpers::chrono_datetime_as_bson_datetime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::categories::models::default_image;
use crate::kind::ProductKind;
use crate::memory::Identified;

/// Multiplier applied to `price` for the displayed `vatPrice`.
pub const VAT_FACTOR: f64 = 1.7;

/// `price` with VAT, two decimals.
pub fn vat_price(price: f64) -> String {
    format!("{:.2}", price * VAT_FACTOR)
}

/// Book or food document; the collection decides which.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub instock: i64,
    /// Owning book or food category
    pub category: ObjectId,
    /// Publisher who created the record
    pub user: ObjectId,
    #[serde(default = "default_image")]
    pub image: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Expects an input that already passed validation.
    pub fn new(category: ObjectId, user: ObjectId, input: ProductInput) -> Self {
        let now = Utc::now();
        Self {
            id: ObjectId::new(),
            title: input.title,
            description: input.description,
            price: input.price.unwrap_or_default(),
            instock: input.instock.unwrap_or_default(),
            category,
            user,
            image: default_image(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, input: ProductInput) {
        self.title = input.title;
        self.description = input.description;
        if let Some(price) = input.price {
            self.price = price;
        }
        if let Some(instock) = input.instock {
            self.instock = instock;
        }
        self.updated_at = Utc::now();
    }
}

impl Identified for Product {
    fn id(&self) -> ObjectId {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub instock: i64,
    pub category: String,
    pub user: String,
    pub image: String,
    /// `price * 1.7`, two decimals
    pub vat_price: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id.to_hex(),
            vat_price: vat_price(product.price),
            title: product.title,
            description: product.description,
            price: product.price,
            instock: product.instock,
            category: product.category.to_hex(),
            user: product.user.to_hex(),
            image: product.image,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

/// Create and update body, JSON or multipart with an `image` file.
/// Numbers may arrive as text.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct ProductInput {
    #[serde(default)]
    #[validate(length(min = 1, message = "Please provide a title"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Please provide a description"))]
    pub description: String,
    #[serde(default, deserialize_with = "optional_number")]
    #[validate(required(message = "Please provide a price"))]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "optional_number")]
    #[validate(required(message = "Please provide an instock"))]
    pub instock: Option<i64>,
}

fn vat_price_field(document: &Document) -> Option<Bson> {
    let price = match document.get("price")? {
        Bson::Double(n) => *n,
        Bson::Int32(n) => f64::from(*n),
        Bson::Int64(n) => *n as f64,
        _ => return None,
    };
    Some(Bson::String(vat_price(price)))
}

/// Listing and single-record view: parent category and owner are expanded,
/// `vatPrice` is added.
pub fn list_schema(kind: ProductKind) -> CollectionSchema {
    CollectionSchema::new(kind.collection())
        .field("title", FieldKind::Text)
        .field("description", FieldKind::Text)
        .field("image", FieldKind::Text)
        .field("price", FieldKind::Number)
        .field("instock", FieldKind::Number)
        .field("category", FieldKind::ObjectId)
        .field("user", FieldKind::ObjectId)
        .relation(
            Relation::new("category", kind.parent().collection()).select(["title", "description"]),
        )
        .relation(Relation::new("user", "users").select(["name", "email", "role", "avatar"]))
        .computed("vatPrice", vat_price_field)
}
