//! MongoDB implementation of CategoryRepository

use async_trait::async_trait;
use mongodb::{
    Collection, Database, IndexModel,
    bson::{doc, oid::ObjectId},
    options::{IndexOptions, ReturnDocument},
};
use tracing::instrument;

use super::models::{CATEGORIES_COLLECTION, Category};
use super::repository::CategoryRepository;
use crate::error::CatalogResult;

pub struct MongoCategoryRepository {
    collection: Collection<Category>,
}

impl MongoCategoryRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection::<Category>(CATEGORIES_COLLECTION),
        }
    }

    pub async fn init_indexes(&self) -> CatalogResult<()> {
        let indexes = vec![
            IndexModel::builder()
                .keys(doc! { "createdAt": -1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_created_at".to_string())
                        .build(),
                )
                .build(),
        ];

        self.collection.create_indexes(indexes).await?;
        tracing::info!("Category indexes created successfully");
        Ok(())
    }
}

#[async_trait]
impl CategoryRepository for MongoCategoryRepository {
    #[instrument(skip(self, category), fields(category_id = %category.id))]
    async fn create(&self, category: Category) -> CatalogResult<Category> {
        self.collection.insert_one(&category).await?;

        tracing::info!(category_id = %category.id, "Category created successfully");
        Ok(category)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: ObjectId) -> CatalogResult<Option<Category>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    #[instrument(skip(self, category), fields(category_id = %category.id))]
    async fn update(&self, category: Category) -> CatalogResult<Option<Category>> {
        let updated = self
            .collection
            .find_one_and_replace(doc! { "_id": category.id }, &category)
            .return_document(ReturnDocument::After)
            .await?;

        if updated.is_some() {
            tracing::info!(category_id = %category.id, "Category updated successfully");
        }
        Ok(updated)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: ObjectId) -> CatalogResult<Option<Category>> {
        let removed = self.collection.find_one_and_delete(doc! { "_id": id }).await?;

        if removed.is_some() {
            tracing::info!(category_id = %id, "Category deleted successfully");
        }
        Ok(removed)
    }

    #[instrument(skip(self))]
    async fn exists(&self, id: ObjectId) -> CatalogResult<bool> {
        Ok(self.collection.count_documents(doc! { "_id": id }).await? > 0)
    }
}
