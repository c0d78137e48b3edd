//! MongoDB implementation of SubCategoryRepository

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::{
    Collection, Database, IndexModel,
    bson::{doc, oid::ObjectId},
    options::{IndexOptions, ReturnDocument},
};
use tracing::instrument;

use super::models::SubCategory;
use super::repository::SubCategoryRepository;
use crate::error::CatalogResult;
use crate::kind::SubCategoryKind;

pub struct MongoSubCategoryRepository {
    kind: SubCategoryKind,
    collection: Collection<SubCategory>,
}

impl MongoSubCategoryRepository {
    pub fn new(db: &Database, kind: SubCategoryKind) -> Self {
        Self {
            kind,
            collection: db.collection::<SubCategory>(kind.collection()),
        }
    }

    /// Parent lookups plus the default listing order
    pub async fn init_indexes(&self) -> CatalogResult<()> {
        let indexes = vec![
            IndexModel::builder()
                .keys(doc! { "category": 1 })
                .options(IndexOptions::builder().name("idx_category".to_string()).build())
                .build(),
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
        tracing::info!(collection = self.kind.collection(), "Sub-category indexes created successfully");
        Ok(())
    }
}

#[async_trait]
impl SubCategoryRepository for MongoSubCategoryRepository {
    #[instrument(skip(self, sub), fields(kind = %self.kind, sub_category_id = %sub.id))]
    async fn create(&self, sub: SubCategory) -> CatalogResult<SubCategory> {
        self.collection.insert_one(&sub).await?;

        tracing::info!(sub_category_id = %sub.id, "{} created successfully", self.kind.label());
        Ok(sub)
    }

    #[instrument(skip(self), fields(kind = %self.kind))]
    async fn get_by_id(&self, id: ObjectId) -> CatalogResult<Option<SubCategory>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    #[instrument(skip(self), fields(kind = %self.kind))]
    async fn list_by_category(&self, category: ObjectId) -> CatalogResult<Vec<SubCategory>> {
        let cursor = self
            .collection
            .find(doc! { "category": category })
            .sort(doc! { "createdAt": 1, "_id": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    #[instrument(skip(self, sub), fields(kind = %self.kind, sub_category_id = %sub.id))]
    async fn update(&self, sub: SubCategory) -> CatalogResult<Option<SubCategory>> {
        let updated = self
            .collection
            .find_one_and_replace(doc! { "_id": sub.id }, &sub)
            .return_document(ReturnDocument::After)
            .await?;

        if updated.is_some() {
            tracing::info!(sub_category_id = %sub.id, "{} updated successfully", self.kind.label());
        }
        Ok(updated)
    }

    #[instrument(skip(self), fields(kind = %self.kind))]
    async fn delete(&self, id: ObjectId) -> CatalogResult<Option<SubCategory>> {
        let removed = self.collection.find_one_and_delete(doc! { "_id": id }).await?;

        if removed.is_some() {
            tracing::info!(sub_category_id = %id, "{} deleted successfully", self.kind.label());
        }
        Ok(removed)
    }

    #[instrument(skip(self), fields(kind = %self.kind))]
    async fn exists(&self, id: ObjectId) -> CatalogResult<bool> {
        Ok(self.collection.count_documents(doc! { "_id": id }).await? > 0)
    }
}
