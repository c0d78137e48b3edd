//! HTTP handlers for `/books` and `/foods`, plus the nested
//! `/bookcategories/{id}/books` routes.

use advanced_results::{AdvancedQuery, ListQuery, Page};
use axum::{Router, extract::State, response::IntoResponse, routing::get};
use axum_helpers::{
    AuthState, CurrentUser, Empty, ImageForm, ObjectIdPath, Role, Success, created,
    errors::responses::{
        BadRequestValidationResponse, ForbiddenResponse, InternalServerErrorResponse,
        InvalidUploadResponse, NotFoundResponse,
    },
    protect,
};
use std::sync::Arc;
use utoipa::OpenApi;

use super::models::{ProductInput, ProductResponse};
use super::repository::ProductRepository;
use super::service::ProductService;
use crate::error::CatalogResult;
use crate::payload::Keyed;
use crate::sub_categories::SubCategoryRepository;

const EDITORS: &[Role] = &[Role::Publisher, Role::Admin];

#[derive(OpenApi)]
#[openapi(
    paths(
        list_products,
        get_product,
        update_product,
        delete_product,
        list_for_sub_category,
        create_for_sub_category,
    ),
    components(
        schemas(ProductInput, ProductResponse),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            InvalidUploadResponse,
            ForbiddenResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Products", description = "Books and foods. Paths are shown for `/books`; `/foods` mirrors them.")
    )
)]
pub struct ApiDoc;

type Shared<R, S> = Arc<ProductService<R, S>>;

/// Routes mounted at the product collection, e.g. `/books`.
pub fn router<R, S>(service: Shared<R, S>, auth: &AuthState) -> Router
where
    R: ProductRepository + 'static,
    S: SubCategoryRepository + 'static,
{
    let routes = Router::new().route("/", get(list_products)).route(
        "/{id}",
        get(get_product).put(update_product).delete(delete_product),
    );

    protect(routes, auth, EDITORS).with_state(service)
}

/// Routes merged into the sub-category router: `/{id}/books`.
pub fn nested_router<R, S>(service: Shared<R, S>, auth: &AuthState) -> Router
where
    R: ProductRepository + 'static,
    S: SubCategoryRepository + 'static,
{
    let path = format!("/{{id}}/{}", service.kind().collection());
    let routes = Router::new().route(
        &path,
        get(list_for_sub_category).post(create_for_sub_category),
    );

    protect(routes, auth, EDITORS).with_state(service)
}

#[utoipa::path(
    get,
    path = "/books",
    tag = "Products",
    security(("bearer" = [])),
    params(ListQuery),
    responses(
        (status = 200, description = "Page of products with category and owner expanded", body = Page),
        (status = 403, response = ForbiddenResponse)
    )
)]
async fn list_products<R: ProductRepository, S: SubCategoryRepository>(
    State(service): State<Shared<R, S>>,
    AdvancedQuery(params): AdvancedQuery,
) -> CatalogResult<Page> {
    service.list(&params).await
}

#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "Products",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product with category and owner expanded", body = ProductResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn get_product<R: ProductRepository, S: SubCategoryRepository>(
    State(service): State<Shared<R, S>>,
    ObjectIdPath(id): ObjectIdPath,
) -> CatalogResult<Success<Keyed<serde_json::Value>>> {
    let product = service.get(id).await?;
    Ok(Success::new(Keyed::new(service.kind().data_key(), product)))
}

/// Update a product; owner or admin only
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "Products",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Product id")),
    request_body(content = ProductInput, description = "JSON or multipart/form-data with an `image` file"),
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn update_product<R: ProductRepository, S: SubCategoryRepository>(
    State(service): State<Shared<R, S>>,
    ObjectIdPath(id): ObjectIdPath,
    caller: CurrentUser,
    form: ImageForm<ProductInput>,
) -> CatalogResult<Success<Keyed<ProductResponse>>> {
    let product = service.update(id, &caller, form.data, form.image).await?;
    Ok(Success::new(Keyed::new(service.kind().data_key(), product)))
}

#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "Products",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product and its image removed", body = Success<Empty>),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn delete_product<R: ProductRepository, S: SubCategoryRepository>(
    State(service): State<Shared<R, S>>,
    ObjectIdPath(id): ObjectIdPath,
    caller: CurrentUser,
) -> CatalogResult<Success<Empty>> {
    service.delete(id, &caller).await?;
    Ok(Success::new(Empty {}))
}

#[utoipa::path(
    get,
    path = "/bookcategories/{id}/books",
    tag = "Products",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Book category id"), ListQuery),
    responses(
        (status = 200, description = "Page of the sub-category's products", body = Page),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn list_for_sub_category<R: ProductRepository, S: SubCategoryRepository>(
    State(service): State<Shared<R, S>>,
    ObjectIdPath(parent): ObjectIdPath,
    AdvancedQuery(params): AdvancedQuery,
) -> CatalogResult<Page> {
    service.list_for_sub_category(parent, &params).await
}

/// Create a product owned by the caller, optionally with an `image` file
#[utoipa::path(
    post,
    path = "/bookcategories/{id}/books",
    tag = "Products",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Book category id")),
    request_body(content = ProductInput, description = "JSON or multipart/form-data with an `image` file"),
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 400, response = InvalidUploadResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn create_for_sub_category<R: ProductRepository, S: SubCategoryRepository>(
    State(service): State<Shared<R, S>>,
    ObjectIdPath(parent): ObjectIdPath,
    caller: CurrentUser,
    form: ImageForm<ProductInput>,
) -> CatalogResult<impl IntoResponse> {
    let product = service.create(parent, &caller, form.data, form.image).await?;
    Ok(created(Keyed::new(service.kind().data_key(), product)))
}
