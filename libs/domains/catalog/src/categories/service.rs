use advanced_results::{AdvancedResults, Page, QueryParams};
use axum_helpers::{ImageStore, UploadedImage};
use mongodb::bson::oid::ObjectId;
use std::sync::Arc;
use tracing::instrument;

use super::models::{Category, CategoryResponse, CreateCategory, UpdateCategory};
use super::repository::CategoryRepository;
use crate::error::{CatalogError, CatalogResult};

pub struct CategoryService<R: CategoryRepository> {
    repository: Arc<R>,
    listing: AdvancedResults,
    images: ImageStore,
}

impl<R: CategoryRepository> CategoryService<R> {
    pub fn new(repository: Arc<R>, listing: AdvancedResults, images: ImageStore) -> Self {
        Self {
            repository,
            listing,
            images,
        }
    }

    pub async fn list(&self, params: &QueryParams) -> CatalogResult<Page> {
        Ok(self.listing.execute(params).await?)
    }

    pub async fn get(&self, id: ObjectId) -> CatalogResult<CategoryResponse> {
        Ok(self.find(id).await?.into())
    }

    /// Nothing is written to disk unless the category is valid.
    #[instrument(skip(self, input, image))]
    pub async fn create(
        &self,
        input: CreateCategory,
        image: Option<UploadedImage>,
    ) -> CatalogResult<CategoryResponse> {
        if input.title.trim().is_empty() || input.description.trim().is_empty() {
            return Err(CatalogError::CategoryFields);
        }
        if let Some(image) = &image {
            self.images.validate(image)?;
        }

        let mut category = Category::new(input.title, input.description);
        let stored = match &image {
            Some(image) => Some(self.images.save(image).await?),
            None => None,
        };
        if let Some(name) = &stored {
            category.image = name.clone();
        }

        match self.repository.create(category).await {
            Ok(created) => Ok(created.into()),
            Err(e) => {
                if let Some(name) = stored {
                    self.images.remove(&name).await;
                }
                Err(e)
            }
        }
    }

    /// A new image replaces the stored file; without one the image is kept.
    #[instrument(skip(self, input, image))]
    pub async fn update(
        &self,
        id: ObjectId,
        input: UpdateCategory,
        image: Option<UploadedImage>,
    ) -> CatalogResult<CategoryResponse> {
        let mut category = self.find(id).await?;
        if let Some(image) = &image {
            self.images.validate(image)?;
        }

        if let Some(title) = input.title {
            category.title = title;
        }
        if let Some(description) = input.description {
            category.description = description;
        }

        let previous = category.image.clone();
        let stored = match &image {
            Some(image) => Some(self.images.save(image).await?),
            None => None,
        };
        if let Some(name) = &stored {
            category.image = name.clone();
        }
        category.touch();

        let updated = match self.repository.update(category).await {
            Ok(Some(updated)) => updated,
            outcome => {
                if let Some(name) = &stored {
                    self.images.remove(name).await;
                }
                return Err(outcome.err().unwrap_or(CatalogError::CategoryNotFound(id)));
            }
        };

        if stored.is_some() {
            self.images.remove(&previous).await;
        }
        Ok(updated.into())
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: ObjectId) -> CatalogResult<()> {
        let removed = self
            .repository
            .delete(id)
            .await?
            .ok_or(CatalogError::CategoryNotFound(id))?;

        self.images.remove(&removed.image).await;
        Ok(())
    }

    async fn find(&self, id: ObjectId) -> CatalogResult<Category> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or(CatalogError::CategoryNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::models::list_schema;
    use crate::categories::repository::{InMemoryCategoryRepository, MockCategoryRepository};
    use advanced_results::MemoryDocumentSource;
    use axum_helpers::{AppError, UploadConfig};

    fn png(name: &str) -> UploadedImage {
        UploadedImage {
            field: "image".into(),
            file_name: name.into(),
            content_type: "image/png".into(),
            bytes: vec![7u8; 32].into(),
        }
    }

    fn service<R: CategoryRepository>(repo: R, dir: &tempfile::TempDir) -> CategoryService<R> {
        CategoryService::new(
            Arc::new(repo),
            AdvancedResults::new(Arc::new(MemoryDocumentSource::new(vec![])), list_schema()),
            ImageStore::new(UploadConfig::new(dir.path())),
        )
    }

    fn input(title: &str, description: &str) -> CreateCategory {
        CreateCategory {
            title: title.into(),
            description: description.into(),
        }
    }

    fn files(dir: &tempfile::TempDir) -> usize {
        std::fs::read_dir(dir.path()).map(|d| d.count()).unwrap_or(0)
    }

    #[tokio::test]
    async fn test_create_requires_title_and_description() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = MockCategoryRepository::new();
        repo.expect_create().never();

        let err = service(repo, &dir)
            .create(input("Books", " "), Some(png("cover.png")))
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::CategoryFields));
        assert_eq!(files(&dir), 0);
    }

    #[tokio::test]
    async fn test_failed_insert_removes_image() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = MockCategoryRepository::new();
        repo.expect_create()
            .times(1)
            .returning(|_| Err(AppError::InternalServerError("down".into()).into()));

        let result = service(repo, &dir)
            .create(input("Books", "Paper"), Some(png("cover.png")))
            .await;

        assert!(result.is_err());
        assert_eq!(files(&dir), 0);
    }

    #[tokio::test]
    async fn test_update_replaces_image_and_delete_removes_it() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(InMemoryCategoryRepository::new(), &dir);

        let created = service
            .create(input("Books", "Paper"), Some(png("old.png")))
            .await
            .unwrap();
        let id = ObjectId::parse_str(&created.id).unwrap();

        // No new file keeps the image
        let kept = service
            .update(
                id,
                UpdateCategory {
                    title: Some("Novels".into()),
                    description: None,
                },
                None,
            )
            .await
            .unwrap();
        assert_eq!(kept.image, created.image);
        assert_eq!(kept.title, "Novels");
        assert_eq!(kept.description, "Paper");

        let replaced = service
            .update(id, UpdateCategory::default(), Some(png("new.png")))
            .await
            .unwrap();
        assert!(replaced.image.ends_with("-new.png"));
        assert!(!dir.path().join(&created.image).exists());
        assert!(dir.path().join(&replaced.image).exists());

        service.delete(id).await.unwrap();
        assert_eq!(files(&dir), 0);
        assert!(matches!(
            service.get(id).await,
            Err(CatalogError::CategoryNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_missing_category_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(InMemoryCategoryRepository::new(), &dir);

        let err = service
            .update(ObjectId::new(), UpdateCategory::default(), Some(png("x.png")))
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::CategoryNotFound(_)));
        assert_eq!(files(&dir), 0);
    }
}
