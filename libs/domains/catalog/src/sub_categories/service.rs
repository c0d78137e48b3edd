use advanced_results::{AdvancedResults, Page, QueryParams};
use mongodb::bson::oid::ObjectId;
use std::sync::Arc;
use tracing::instrument;

use super::models::{SubCategory, SubCategoryInput, SubCategoryResponse};
use super::repository::SubCategoryRepository;
use crate::categories::CategoryRepository;
use crate::error::{CatalogError, CatalogResult};
use crate::kind::SubCategoryKind;

/// Book or food categories, each owned by a top-level category.
pub struct SubCategoryService<R: SubCategoryRepository, C: CategoryRepository> {
    kind: SubCategoryKind,
    repository: Arc<R>,
    categories: Arc<C>,
    listing: AdvancedResults,
}

impl<R: SubCategoryRepository, C: CategoryRepository> SubCategoryService<R, C> {
    pub fn new(
        kind: SubCategoryKind,
        repository: Arc<R>,
        categories: Arc<C>,
        listing: AdvancedResults,
    ) -> Self {
        Self {
            kind,
            repository,
            categories,
            listing,
        }
    }

    pub fn kind(&self) -> SubCategoryKind {
        self.kind
    }

    pub async fn list(&self, params: &QueryParams) -> CatalogResult<Page> {
        Ok(self.listing.execute(params).await?)
    }

    /// All children of `category`; none at all is reported as not found.
    #[instrument(skip(self), fields(kind = %self.kind))]
    pub async fn list_for_category(
        &self,
        category: ObjectId,
    ) -> CatalogResult<Vec<SubCategoryResponse>> {
        let children = self.repository.list_by_category(category).await?;
        if children.is_empty() {
            return Err(CatalogError::EmptyCategory {
                kind: self.kind,
                category,
            });
        }
        Ok(children.into_iter().map(Into::into).collect())
    }

    pub async fn get(&self, id: ObjectId) -> CatalogResult<SubCategoryResponse> {
        self.repository
            .get_by_id(id)
            .await?
            .map(Into::into)
            .ok_or(CatalogError::SubCategoryNotFound {
                kind: self.kind,
                id,
            })
    }

    #[instrument(skip(self, input), fields(kind = %self.kind))]
    pub async fn create(
        &self,
        category: ObjectId,
        input: SubCategoryInput,
    ) -> CatalogResult<SubCategoryResponse> {
        if !self.categories.exists(category).await? {
            return Err(CatalogError::CategoryNotFound(category));
        }

        let created = self.repository.create(SubCategory::new(category, input)).await?;
        Ok(created.into())
    }

    #[instrument(skip(self, input), fields(kind = %self.kind))]
    pub async fn update(
        &self,
        id: ObjectId,
        input: SubCategoryInput,
    ) -> CatalogResult<SubCategoryResponse> {
        let missing = || CatalogError::NoSubCategory {
            kind: self.kind,
            id,
        };

        let mut sub = self.repository.get_by_id(id).await?.ok_or_else(missing)?;
        sub.title = input.title;
        sub.description = input.description;
        sub.updated_at = chrono::Utc::now();

        let updated = self.repository.update(sub).await?.ok_or_else(missing)?;
        Ok(updated.into())
    }

    #[instrument(skip(self), fields(kind = %self.kind))]
    pub async fn delete(&self, id: ObjectId) -> CatalogResult<()> {
        self.repository
            .delete(id)
            .await?
            .ok_or(CatalogError::SubCategoryNotFound {
                kind: self.kind,
                id,
            })?;
        Ok(())
    }
}
