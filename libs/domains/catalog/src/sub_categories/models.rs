use advanced_results::{CollectionSchema, FieldKind};
use chrono::{DateTime, Utc};
use mongodb::bson::{oid::ObjectId, serde_helpers::chrono_datetime_as_bson_datetime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::kind::SubCategoryKind;
use crate::memory::Identified;

/// Book or food category document; the collection decides which.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubCategory {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    pub description: String,
    /// Parent [`Category`](crate::categories::Category)
    pub category: ObjectId,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl SubCategory {
    pub fn new(category: ObjectId, input: SubCategoryInput) -> Self {
        let now = Utc::now();
        Self {
            id: ObjectId::new(),
            title: input.title,
            description: input.description,
            category,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Identified for SubCategory {
    fn id(&self) -> ObjectId {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubCategoryResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SubCategory> for SubCategoryResponse {
    fn from(sub: SubCategory) -> Self {
        Self {
            id: sub.id.to_hex(),
            title: sub.title,
            description: sub.description,
            category: sub.category.to_hex(),
            created_at: sub.created_at,
            updated_at: sub.updated_at,
        }
    }
}

/// Body of both create and update; the parent comes from the path.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct SubCategoryInput {
    #[serde(default)]
    #[validate(length(min = 1, message = "Please provide a title"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Please provide a description"))]
    pub description: String,
}

pub fn list_schema(kind: SubCategoryKind) -> CollectionSchema {
    CollectionSchema::new(kind.collection())
        .field("title", FieldKind::Text)
        .field("description", FieldKind::Text)
        .field("category", FieldKind::ObjectId)
}
