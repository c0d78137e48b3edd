use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

use super::models::Category;
use crate::error::CatalogResult;
use crate::memory::MemoryCollection;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn create(&self, category: Category) -> CatalogResult<Category>;

    async fn get_by_id(&self, id: ObjectId) -> CatalogResult<Option<Category>>;

    /// Replace the stored document; `None` when it no longer exists
    async fn update(&self, category: Category) -> CatalogResult<Option<Category>>;

    /// Remove and return the document
    async fn delete(&self, id: ObjectId) -> CatalogResult<Option<Category>>;

    async fn exists(&self, id: ObjectId) -> CatalogResult<bool> {
        Ok(self.get_by_id(id).await?.is_some())
    }
}

/// In-memory implementation of CategoryRepository (for development/testing)
#[derive(Debug, Clone, Default)]
pub struct InMemoryCategoryRepository {
    categories: MemoryCollection<Category>,
}

impl InMemoryCategoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn create(&self, category: Category) -> CatalogResult<Category> {
        Ok(self.categories.insert(category).await)
    }

    async fn get_by_id(&self, id: ObjectId) -> CatalogResult<Option<Category>> {
        Ok(self.categories.get(id).await)
    }

    async fn update(&self, category: Category) -> CatalogResult<Option<Category>> {
        Ok(self.categories.replace(category).await)
    }

    async fn delete(&self, id: ObjectId) -> CatalogResult<Option<Category>> {
        Ok(self.categories.remove(id).await)
    }
}
