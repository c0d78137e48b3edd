//! MongoDB implementation of ProductRepository

use async_trait::async_trait;
use mongodb::{
    Collection, Database, IndexModel,
    bson::{doc, oid::ObjectId},
    options::{IndexOptions, ReturnDocument},
};
use tracing::instrument;

use super::models::Product;
use super::repository::ProductRepository;
use crate::error::CatalogResult;
use crate::kind::ProductKind;

pub struct MongoProductRepository {
    kind: ProductKind,
    collection: Collection<Product>,
}

impl MongoProductRepository {
    pub fn new(db: &Database, kind: ProductKind) -> Self {
        Self {
            kind,
            collection: db.collection::<Product>(kind.collection()),
        }
    }

    pub async fn init_indexes(&self) -> CatalogResult<()> {
        let index = |keys, name: &str| {
            IndexModel::builder()
                .keys(keys)
                .options(IndexOptions::builder().name(name.to_string()).build())
                .build()
        };
        let indexes = vec![
            index(doc! { "category": 1 }, "idx_category"),
            index(doc! { "user": 1 }, "idx_user"),
            index(doc! { "createdAt": -1 }, "idx_created_at"),
            index(doc! { "price": 1 }, "idx_price"),
        ];

        self.collection.create_indexes(indexes).await?;
        tracing::info!(collection = self.kind.collection(), "Product indexes created successfully");
        Ok(())
    }
}

#[async_trait]
impl ProductRepository for MongoProductRepository {
    #[instrument(skip(self, product), fields(kind = %self.kind, product_id = %product.id))]
    async fn create(&self, product: Product) -> CatalogResult<Product> {
        self.collection.insert_one(&product).await?;

        tracing::info!(product_id = %product.id, owner = %product.user, "Product created successfully");
        Ok(product)
    }

    #[instrument(skip(self), fields(kind = %self.kind))]
    async fn get_by_id(&self, id: ObjectId) -> CatalogResult<Option<Product>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    #[instrument(skip(self, product), fields(kind = %self.kind, product_id = %product.id))]
    async fn update(&self, product: Product) -> CatalogResult<Option<Product>> {
        let updated = self
            .collection
            .find_one_and_replace(doc! { "_id": product.id }, &product)
            .return_document(ReturnDocument::After)
            .await?;

        if updated.is_some() {
            tracing::info!(product_id = %product.id, "Product updated successfully");
        }
        Ok(updated)
    }

    #[instrument(skip(self), fields(kind = %self.kind))]
    async fn delete(&self, id: ObjectId) -> CatalogResult<Option<Product>> {
        let removed = self.collection.find_one_and_delete(doc! { "_id": id }).await?;

        if removed.is_some() {
            tracing::info!(product_id = %id, "Product deleted successfully");
        }
        Ok(removed)
    }
}
