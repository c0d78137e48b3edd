use advanced_results::{AdvancedResults, Page, QueryParams};
use axum_helpers::{AppError, CurrentUser, ImageStore, Role, UploadedImage};
use mongodb::bson::{doc, oid::ObjectId};
use std::sync::Arc;
use tracing::instrument;
use validator::Validate;

use super::models::{Product, ProductInput, ProductResponse};
use super::repository::ProductRepository;
use crate::error::{CatalogError, CatalogResult};
use crate::kind::ProductKind;
use crate::sub_categories::SubCategoryRepository;

/// Books or foods. Records belong to a sub-category of the matching line
/// and to the publisher who created them.
pub struct ProductService<R: ProductRepository, S: SubCategoryRepository> {
    kind: ProductKind,
    repository: Arc<R>,
    parents: Arc<S>,
    listing: AdvancedResults,
    images: ImageStore,
}

impl<R: ProductRepository, S: SubCategoryRepository> ProductService<R, S> {
    pub fn new(
        kind: ProductKind,
        repository: Arc<R>,
        parents: Arc<S>,
        listing: AdvancedResults,
        images: ImageStore,
    ) -> Self {
        Self {
            kind,
            repository,
            parents,
            listing,
            images,
        }
    }

    pub fn kind(&self) -> ProductKind {
        self.kind
    }

    pub async fn list(&self, params: &QueryParams) -> CatalogResult<Page> {
        Ok(self.listing.execute(params).await?)
    }

    /// Products of one sub-category, with the usual query options.
    #[instrument(skip(self, params), fields(kind = %self.kind))]
    pub async fn list_for_sub_category(
        &self,
        parent: ObjectId,
        params: &QueryParams,
    ) -> CatalogResult<Page> {
        self.require_parent(parent).await?;
        Ok(self
            .listing
            .execute_within(params, doc! { "category": parent })
            .await?)
    }

    /// Single record with its category and owner expanded.
    pub async fn get(&self, id: ObjectId) -> CatalogResult<serde_json::Value> {
        self.listing
            .find_one(doc! { "_id": id })
            .await?
            .ok_or(CatalogError::ProductNotFound(id))
    }

    /// Stores the product under `parent`, owned by `caller`.
    #[instrument(skip(self, caller, input, image), fields(kind = %self.kind, user_id = %caller.id))]
    pub async fn create(
        &self,
        parent: ObjectId,
        caller: &CurrentUser,
        input: ProductInput,
        image: Option<UploadedImage>,
    ) -> CatalogResult<ProductResponse> {
        input.validate().map_err(AppError::from)?;
        if let Some(image) = &image {
            self.images.validate(image)?;
        }
        self.require_parent(parent).await?;
        if !matches!(caller.role, Role::Admin | Role::Publisher) {
            return Err(CatalogError::RoleCannotPublish(caller.role));
        }

        let mut product = Product::new(parent, caller.id, input);
        let stored = self.store(image.as_ref()).await?;
        if let Some(name) = &stored {
            product.image = name.clone();
        }

        match self.repository.create(product).await {
            Ok(created) => Ok(created.into()),
            Err(e) => {
                self.discard(stored.as_deref()).await;
                Err(e)
            }
        }
    }

    /// Owner or admin only. The owner and category never change; a new
    /// image replaces the stored file.
    #[instrument(skip(self, caller, input, image), fields(kind = %self.kind, user_id = %caller.id))]
    pub async fn update(
        &self,
        id: ObjectId,
        caller: &CurrentUser,
        input: ProductInput,
        image: Option<UploadedImage>,
    ) -> CatalogResult<ProductResponse> {
        input.validate().map_err(AppError::from)?;
        let missing = || CatalogError::NoProduct {
            kind: self.kind,
            id,
        };

        let mut product = self.repository.get_by_id(id).await?.ok_or_else(missing)?;
        self.require_owner(caller, &product, "update")?;
        if let Some(image) = &image {
            self.images.validate(image)?;
        }

        product.apply(input);
        let previous = product.image.clone();
        let stored = self.store(image.as_ref()).await?;
        if let Some(name) = &stored {
            product.image = name.clone();
        }

        let updated = match self.repository.update(product).await {
            Ok(Some(updated)) => updated,
            outcome => {
                self.discard(stored.as_deref()).await;
                return Err(outcome.err().unwrap_or_else(missing));
            }
        };

        if stored.is_some() {
            self.images.remove(&previous).await;
        }
        Ok(updated.into())
    }

    /// Owner or admin only; the image file goes with the record.
    #[instrument(skip(self, caller), fields(kind = %self.kind, user_id = %caller.id))]
    pub async fn delete(&self, id: ObjectId, caller: &CurrentUser) -> CatalogResult<()> {
        let product = self
            .repository
            .get_by_id(id)
            .await?
            .ok_or(CatalogError::ProductNotFound(id))?;
        self.require_owner(caller, &product, "delete")?;

        let removed = self
            .repository
            .delete(id)
            .await?
            .ok_or(CatalogError::ProductNotFound(id))?;
        self.images.remove(&removed.image).await;
        Ok(())
    }

    async fn require_parent(&self, parent: ObjectId) -> CatalogResult<()> {
        if self.parents.exists(parent).await? {
            Ok(())
        } else {
            Err(CatalogError::SubCategoryNotFound {
                kind: self.kind.parent(),
                id: parent,
            })
        }
    }

    fn require_owner(
        &self,
        caller: &CurrentUser,
        product: &Product,
        action: &'static str,
    ) -> CatalogResult<()> {
        if caller.can_modify(&product.user) {
            return Ok(());
        }
        tracing::warn!(product_id = %product.id, owner = %product.user, "Product change refused");
        Err(CatalogError::NotOwner {
            kind: self.kind,
            user: caller.id,
            action,
        })
    }

    async fn store(&self, image: Option<&UploadedImage>) -> CatalogResult<Option<String>> {
        match image {
            Some(image) => Ok(Some(self.images.save(image).await?)),
            None => Ok(None),
        }
    }

    async fn discard(&self, stored: Option<&str>) {
        if let Some(name) = stored {
            self.images.remove(name).await;
        }
    }
}
