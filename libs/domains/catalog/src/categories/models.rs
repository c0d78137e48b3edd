use advanced_results::{CollectionSchema, FieldKind};
use chrono::{DateTime, Utc};
use mongodb::bson::{oid::ObjectId, serde_helpers::chrono_datetime_as_bson_datetime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::memory::Identified;

/// Image assigned when none is uploaded
pub const DEFAULT_IMAGE: &str = "no-pic.png";

pub const CATEGORIES_COLLECTION: &str = "categories";

pub(crate) fn default_image() -> String {
    DEFAULT_IMAGE.to_string()
}

/// Top-level category document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    pub description: String,
    #[serde(default = "default_image")]
    pub image: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Category {
    pub fn new(title: String, description: String) -> Self {
        let now = Utc::now();
        Self {
            id: ObjectId::new(),
            title,
            description,
            image: default_image(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Identified for Category {
    fn id(&self) -> ObjectId {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            id: category.id.to_hex(),
            title: category.title,
            description: category.description,
            image: category.image,
            created_at: category.created_at,
            updated_at: category.updated_at,
        }
    }
}

/// Create body, JSON or multipart with an `image` file. Blank fields are
/// rejected by the service with a single message.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CreateCategory {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Absent fields keep their value
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCategory {
    #[validate(length(min = 1, message = "title is require"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "Description is require"))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CategoryData {
    pub category: CategoryResponse,
}

pub fn list_schema() -> CollectionSchema {
    CollectionSchema::new(CATEGORIES_COLLECTION)
        .field("title", FieldKind::Text)
        .field("description", FieldKind::Text)
        .field("image", FieldKind::Text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson;

    #[test]
    fn test_document_shape() {
        let category = Category::new("Books".into(), "Paper things".into());
        let document = bson::to_document(&category).unwrap();

        assert_eq!(document.get_str("image").unwrap(), "no-pic.png");
        assert!(document.get_object_id("_id").is_ok());
        assert!(document.get_datetime("updatedAt").is_ok());
    }

    #[test]
    fn test_missing_image_defaults() {
        let document = bson::doc! {
            "_id": ObjectId::new(),
            "title": "Food",
            "description": "Edible things",
            "createdAt": bson::DateTime::now(),
            "updatedAt": bson::DateTime::now(),
        };
        let category: Category = bson::from_document(document).unwrap();
        assert_eq!(category.image, DEFAULT_IMAGE);
    }
}
