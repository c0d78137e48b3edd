//! HTTP handlers for `/bookcategories` and `/foodcategories`, plus the
//! nested `/categories/{id}/bookcategories` routes.

use advanced_results::{AdvancedQuery, ListQuery, Page};
use axum::{
    Router,
    extract::State,
    response::IntoResponse,
    routing::get,
};
use axum_helpers::{
    AuthState, Empty, ObjectIdPath, Role, Success, ValidatedJson, created,
    errors::responses::{
        BadRequestValidationResponse, ForbiddenResponse, InternalServerErrorResponse,
        NotFoundResponse,
    },
    protect,
};
use std::sync::Arc;
use utoipa::OpenApi;

use super::models::{SubCategoryInput, SubCategoryResponse};
use super::repository::SubCategoryRepository;
use super::service::SubCategoryService;
use crate::categories::CategoryRepository;
use crate::error::CatalogResult;
use crate::payload::{CountedList, Keyed};

/// Roles allowed on every sub-category route
pub const EDITORS: &[Role] = &[Role::Admin, Role::Publisher];

#[derive(OpenApi)]
#[openapi(
    paths(
        list_sub_categories,
        get_sub_category,
        update_sub_category,
        delete_sub_category,
        list_for_category,
        create_for_category,
    ),
    components(
        schemas(SubCategoryInput, SubCategoryResponse),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            ForbiddenResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Sub-categories", description = "Book and food categories. Paths are shown for `/bookcategories`; `/foodcategories` mirrors them.")
    )
)]
pub struct ApiDoc;

type Shared<R, C> = Arc<SubCategoryService<R, C>>;

/// Routes mounted at the sub-category collection, e.g. `/bookcategories`.
pub fn router<R, C>(service: Shared<R, C>, auth: &AuthState) -> Router
where
    R: SubCategoryRepository + 'static,
    C: CategoryRepository + 'static,
{
    let routes = Router::new().route("/", get(list_sub_categories)).route(
        "/{id}",
        get(get_sub_category)
            .put(update_sub_category)
            .delete(delete_sub_category),
    );

    protect(routes, auth, EDITORS).with_state(service)
}

/// Routes merged into the `/categories` router: `/{id}/bookcategories`.
pub fn nested_router<R, C>(service: Shared<R, C>, auth: &AuthState) -> Router
where
    R: SubCategoryRepository + 'static,
    C: CategoryRepository + 'static,
{
    let path = format!("/{{id}}/{}", service.kind().collection());
    let routes = Router::new().route(
        &path,
        get(list_for_category).post(create_for_category),
    );

    protect(routes, auth, EDITORS).with_state(service)
}

#[utoipa::path(
    get,
    path = "/bookcategories",
    tag = "Sub-categories",
    security(("bearer" = [])),
    params(ListQuery),
    responses(
        (status = 200, description = "Page of sub-categories", body = Page),
        (status = 403, response = ForbiddenResponse)
    )
)]
async fn list_sub_categories<R: SubCategoryRepository, C: CategoryRepository>(
    State(service): State<Shared<R, C>>,
    AdvancedQuery(params): AdvancedQuery,
) -> CatalogResult<Page> {
    service.list(&params).await
}

/// Single sub-category as `{ bookCategory }` or `{ foodCategory }`
#[utoipa::path(
    get,
    path = "/bookcategories/{id}",
    tag = "Sub-categories",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Sub-category id")),
    responses(
        (status = 200, description = "Sub-category found", body = SubCategoryResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn get_sub_category<R: SubCategoryRepository, C: CategoryRepository>(
    State(service): State<Shared<R, C>>,
    ObjectIdPath(id): ObjectIdPath,
) -> CatalogResult<Success<Keyed<SubCategoryResponse>>> {
    let sub = service.get(id).await?;
    Ok(Success::new(Keyed::new(service.kind().data_key(), sub)))
}

#[utoipa::path(
    put,
    path = "/bookcategories/{id}",
    tag = "Sub-categories",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Sub-category id")),
    request_body = SubCategoryInput,
    responses(
        (status = 200, description = "Sub-category updated", body = SubCategoryResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn update_sub_category<R: SubCategoryRepository, C: CategoryRepository>(
    State(service): State<Shared<R, C>>,
    ObjectIdPath(id): ObjectIdPath,
    ValidatedJson(input): ValidatedJson<SubCategoryInput>,
) -> CatalogResult<Success<Keyed<SubCategoryResponse>>> {
    let sub = service.update(id, input).await?;
    Ok(Success::new(Keyed::new(service.kind().data_key(), sub)))
}

#[utoipa::path(
    delete,
    path = "/bookcategories/{id}",
    tag = "Sub-categories",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Sub-category id")),
    responses(
        (status = 200, description = "Sub-category removed", body = Success<Empty>),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn delete_sub_category<R: SubCategoryRepository, C: CategoryRepository>(
    State(service): State<Shared<R, C>>,
    ObjectIdPath(id): ObjectIdPath,
) -> CatalogResult<Success<Empty>> {
    service.delete(id).await?;
    Ok(Success::new(Empty {}))
}

/// Children of one category as `{ count, bookCategories }`
#[utoipa::path(
    get,
    path = "/categories/{id}/bookcategories",
    tag = "Sub-categories",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Parent category id")),
    responses(
        (status = 200, description = "Children of the category", body = Vec<SubCategoryResponse>),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn list_for_category<R: SubCategoryRepository, C: CategoryRepository>(
    State(service): State<Shared<R, C>>,
    ObjectIdPath(category): ObjectIdPath,
) -> CatalogResult<Success<CountedList<SubCategoryResponse>>> {
    let items = service.list_for_category(category).await?;
    Ok(Success::new(CountedList {
        key: service.kind().list_key(),
        items,
    }))
}

#[utoipa::path(
    post,
    path = "/categories/{id}/bookcategories",
    tag = "Sub-categories",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Parent category id")),
    request_body = SubCategoryInput,
    responses(
        (status = 201, description = "Sub-category created", body = SubCategoryResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn create_for_category<R: SubCategoryRepository, C: CategoryRepository>(
    State(service): State<Shared<R, C>>,
    ObjectIdPath(category): ObjectIdPath,
    ValidatedJson(input): ValidatedJson<SubCategoryInput>,
) -> CatalogResult<impl IntoResponse> {
    let sub = service.create(category, input).await?;
    Ok(created(Keyed::new(service.kind().data_key(), sub)))
}
