use advanced_results::QueryError;
use axum::response::{IntoResponse, Response};
use axum_helpers::{AppError, Role};
use mongodb::bson::oid::ObjectId;
use thiserror::Error;

use crate::kind::{ProductKind, SubCategoryKind};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Category not found with id of {0}")]
    CategoryNotFound(ObjectId),

    #[error("Please provided a valid title and description")]
    CategoryFields,

    #[error("{} not found with id of {id}", .kind.label())]
    SubCategoryNotFound { kind: SubCategoryKind, id: ObjectId },

    #[error("There is no {} with that id: {id}", .kind.label().to_lowercase())]
    NoSubCategory { kind: SubCategoryKind, id: ObjectId },

    #[error("{} not found with categoryId of {category}", .kind.label())]
    EmptyCategory {
        kind: SubCategoryKind,
        category: ObjectId,
    },

    #[error("No {kind} with id of {id}")]
    NoProduct { kind: ProductKind, id: ObjectId },

    #[error("Product not found with id of {0}")]
    ProductNotFound(ObjectId),

    #[error("User role: {0} can not add product to db")]
    RoleCannotPublish(Role),

    #[error("User id: {user} can not {action} this {kind} product")]
    NotOwner {
        kind: ProductKind,
        user: ObjectId,
        action: &'static str,
    },

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Database(#[from] mongodb::error::Error),

    #[error(transparent)]
    App(#[from] AppError),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::CategoryNotFound(_)
            | CatalogError::SubCategoryNotFound { .. }
            | CatalogError::NoSubCategory { .. }
            | CatalogError::EmptyCategory { .. }
            | CatalogError::NoProduct { .. }
            | CatalogError::ProductNotFound(_) => AppError::NotFound(err.to_string()),
            CatalogError::CategoryFields => AppError::BadRequest(err.to_string()),
            CatalogError::RoleCannotPublish(_) | CatalogError::NotOwner { .. } => {
                AppError::Forbidden(err.to_string())
            }
            CatalogError::Query(e) => e.into(),
            CatalogError::Database(e) => AppError::Database(e),
            CatalogError::App(e) => e,
        }
    }
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}
