use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

use super::models::SubCategory;
use crate::error::CatalogResult;
use crate::memory::MemoryCollection;

/// Storage for one sub-category line (book or food).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubCategoryRepository: Send + Sync {
    async fn create(&self, sub: SubCategory) -> CatalogResult<SubCategory>;

    async fn get_by_id(&self, id: ObjectId) -> CatalogResult<Option<SubCategory>>;

    /// Children of one category, oldest first
    async fn list_by_category(&self, category: ObjectId) -> CatalogResult<Vec<SubCategory>>;

    async fn update(&self, sub: SubCategory) -> CatalogResult<Option<SubCategory>>;

    async fn delete(&self, id: ObjectId) -> CatalogResult<Option<SubCategory>>;

    async fn exists(&self, id: ObjectId) -> CatalogResult<bool> {
        Ok(self.get_by_id(id).await?.is_some())
    }
}

/// In-memory implementation of SubCategoryRepository (for development/testing)
#[derive(Debug, Clone, Default)]
pub struct InMemorySubCategoryRepository {
    records: MemoryCollection<SubCategory>,
}

impl InMemorySubCategoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubCategoryRepository for InMemorySubCategoryRepository {
    async fn create(&self, sub: SubCategory) -> CatalogResult<SubCategory> {
        Ok(self.records.insert(sub).await)
    }

    async fn get_by_id(&self, id: ObjectId) -> CatalogResult<Option<SubCategory>> {
        Ok(self.records.get(id).await)
    }

    async fn list_by_category(&self, category: ObjectId) -> CatalogResult<Vec<SubCategory>> {
        let mut children = self.records.filter(|sub| sub.category == category).await;
        children.sort_by_key(|sub| (sub.created_at, sub.id));
        Ok(children)
    }

    async fn update(&self, sub: SubCategory) -> CatalogResult<Option<SubCategory>> {
        Ok(self.records.replace(sub).await)
    }

    async fn delete(&self, id: ObjectId) -> CatalogResult<Option<SubCategory>> {
        Ok(self.records.remove(id).await)
    }
}
