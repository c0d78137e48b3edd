use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

use super::models::Product;
use crate::error::CatalogResult;
use crate::memory::MemoryCollection;

/// Storage for one product line (books or foods).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn create(&self, product: Product) -> CatalogResult<Product>;

    async fn get_by_id(&self, id: ObjectId) -> CatalogResult<Option<Product>>;

    async fn update(&self, product: Product) -> CatalogResult<Option<Product>>;

    async fn delete(&self, id: ObjectId) -> CatalogResult<Option<Product>>;
}

/// In-memory implementation of ProductRepository (for development/testing)
#[derive(Debug, Clone, Default)]
pub struct InMemoryProductRepository {
    records: MemoryCollection<Product>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn create(&self, product: Product) -> CatalogResult<Product> {
        Ok(self.records.insert(product).await)
    }

    async fn get_by_id(&self, id: ObjectId) -> CatalogResult<Option<Product>> {
        Ok(self.records.get(id).await)
    }

    async fn update(&self, product: Product) -> CatalogResult<Option<Product>> {
        Ok(self.records.replace(product).await)
    }

    async fn delete(&self, id: ObjectId) -> CatalogResult<Option<Product>> {
        Ok(self.records.remove(id).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::products::models::ProductInput;

    #[tokio::test]
    async fn test_update_unknown_product() {
        let repo = InMemoryProductRepository::new();
        let product = Product::new(ObjectId::new(), ObjectId::new(), ProductInput::default());

        assert!(repo.update(product.clone()).await.unwrap().is_none());

        repo.create(product.clone()).await.unwrap();
        let mut changed = product.clone();
        changed.instock = 9;
        assert_eq!(repo.update(changed).await.unwrap().unwrap().instock, 9);
        assert!(repo.delete(product.id).await.unwrap().is_some());
        assert!(repo.get_by_id(product.id).await.unwrap().is_none());
    }
}
