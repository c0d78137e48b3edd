//! HTTP handlers for `/categories`, admin only.

use advanced_results::{AdvancedQuery, ListQuery, Page};
use axum::{Router, extract::State, response::IntoResponse, routing::get};
use axum_helpers::{
    AuthState, Empty, ImageForm, ObjectIdPath, Role, Success, created,
    errors::responses::{
        BadRequestValidationResponse, ForbiddenResponse, InternalServerErrorResponse,
        InvalidUploadResponse, NotFoundResponse,
    },
    protect,
};
use std::sync::Arc;
use utoipa::OpenApi;

use super::models::{CategoryData, CategoryResponse, CreateCategory, UpdateCategory};
use super::repository::CategoryRepository;
use super::service::CategoryService;
use crate::error::CatalogResult;

const ADMIN: &[Role] = &[Role::Admin];

#[derive(OpenApi)]
#[openapi(
    paths(list_categories, create_category, get_category, update_category, delete_category),
    components(
        schemas(CreateCategory, UpdateCategory, CategoryResponse, CategoryData),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            InvalidUploadResponse,
            ForbiddenResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Categories", description = "Top-level catalog categories (admin only)")
    )
)]
pub struct ApiDoc;

pub fn router<R: CategoryRepository + 'static>(
    service: Arc<CategoryService<R>>,
    auth: &AuthState,
) -> Router {
    let routes = Router::new()
        .route("/", get(list_categories).post(create_category))
        .route(
            "/{id}",
            get(get_category).put(update_category).delete(delete_category),
        );

    protect(routes, auth, ADMIN).with_state(service)
}

#[utoipa::path(
    get,
    path = "",
    tag = "Categories",
    security(("bearer" = [])),
    params(ListQuery),
    responses(
        (status = 200, description = "Page of categories", body = Page),
        (status = 403, response = ForbiddenResponse)
    )
)]
async fn list_categories<R: CategoryRepository>(
    State(service): State<Arc<CategoryService<R>>>,
    AdvancedQuery(params): AdvancedQuery,
) -> CatalogResult<Page> {
    service.list(&params).await
}

/// Create a category, optionally with an `image` file
#[utoipa::path(
    post,
    path = "",
    tag = "Categories",
    security(("bearer" = [])),
    request_body(content = CreateCategory, description = "JSON or multipart/form-data with an `image` file"),
    responses(
        (status = 201, description = "Category created", body = Success<CategoryData>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 400, response = InvalidUploadResponse)
    )
)]
async fn create_category<R: CategoryRepository>(
    State(service): State<Arc<CategoryService<R>>>,
    form: ImageForm<CreateCategory>,
) -> CatalogResult<impl IntoResponse> {
    let category = service.create(form.data, form.image).await?;
    Ok(created(CategoryData { category }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Categories",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category found", body = Success<CategoryData>),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn get_category<R: CategoryRepository>(
    State(service): State<Arc<CategoryService<R>>>,
    ObjectIdPath(id): ObjectIdPath,
) -> CatalogResult<Success<CategoryData>> {
    let category = service.get(id).await?;
    Ok(Success::new(CategoryData { category }))
}

/// Update a category; a new `image` file replaces the stored one
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Categories",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Category id")),
    request_body = UpdateCategory,
    responses(
        (status = 200, description = "Category updated", body = Success<CategoryData>),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn update_category<R: CategoryRepository>(
    State(service): State<Arc<CategoryService<R>>>,
    ObjectIdPath(id): ObjectIdPath,
    form: ImageForm<UpdateCategory>,
) -> CatalogResult<Success<CategoryData>> {
    let category = service.update(id, form.data, form.image).await?;
    Ok(Success::new(CategoryData { category }))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Categories",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category and its image removed", body = Success<Empty>),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn delete_category<R: CategoryRepository>(
    State(service): State<Arc<CategoryService<R>>>,
    ObjectIdPath(id): ObjectIdPath,
) -> CatalogResult<Success<Empty>> {
    service.delete(id).await?;
    Ok(Success::new(Empty {}))
}
