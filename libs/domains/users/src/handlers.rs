//! Admin user management mounted at `/users`.

use advanced_results::{AdvancedQuery, ListQuery, Page};
use axum::{
    Router,
    extract::State,
    response::IntoResponse,
    routing::{get, put},
};
use axum_helpers::{
    AuthState, Empty, ImageForm, ObjectIdPath, Role, Success, ValidatedJson, created,
    errors::responses::{
        BadRequestValidationResponse, DuplicateKeyResponse, ForbiddenResponse,
        InternalServerErrorResponse, InvalidUploadResponse, NotFoundResponse,
    },
    protect,
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::UserResult;
use crate::models::{CreateUser, SetPassword, UpdateUser, UserData, UserResponse};
use crate::repository::UserRepository;
use crate::service::UserService;

const ADMIN: &[Role] = &[Role::Admin];

/// OpenAPI documentation for the admin Users API
#[derive(OpenApi)]
#[openapi(
    paths(list_users, create_user, get_user, update_user, delete_user, set_password),
    components(
        schemas(CreateUser, UpdateUser, SetPassword, UserResponse, UserData, Role),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            DuplicateKeyResponse,
            InvalidUploadResponse,
            ForbiddenResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Users", description = "User administration (admin only)")
    )
)]
pub struct ApiDoc;

/// Create the admin users router; every route requires the `admin` role.
pub fn router<R: UserRepository + 'static>(service: Arc<UserService<R>>, auth: &AuthState) -> Router {
    let routes = Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/{id}", get(get_user).put(update_user).delete(delete_user))
        .route("/password/{id}", put(set_password));

    protect(routes, auth, ADMIN).with_state(service)
}

/// List users
#[utoipa::path(
    get,
    path = "",
    tag = "Users",
    security(("bearer" = [])),
    params(ListQuery),
    responses(
        (status = 200, description = "Page of users", body = Page),
        (status = 403, response = ForbiddenResponse)
    )
)]
async fn list_users<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    AdvancedQuery(params): AdvancedQuery,
) -> UserResult<Page> {
    service.list_users(&params).await
}

/// Create a user, optionally with an `avatar` file
#[utoipa::path(
    post,
    path = "",
    tag = "Users",
    security(("bearer" = [])),
    request_body(content = CreateUser, description = "JSON or multipart/form-data with an `avatar` file"),
    responses(
        (status = 201, description = "User created", body = Success<UserData>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 400, response = InvalidUploadResponse)
    )
)]
async fn create_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    form: ImageForm<CreateUser>,
) -> UserResult<impl IntoResponse> {
    let user = service.create_user(form.data, form.image).await?;
    Ok(created(UserData { user }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Users",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "User found", body = Success<UserData>),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn get_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    ObjectIdPath(id): ObjectIdPath,
) -> UserResult<Success<UserData>> {
    let user = service.get_user(id).await?;
    Ok(Success::new(UserData { user }))
}

/// Update a user; a new `avatar` file replaces the stored one
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Users",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "User id")),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated", body = Success<UserData>),
        (status = 404, response = NotFoundResponse),
        (status = 400, response = InvalidUploadResponse)
    )
)]
async fn update_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    ObjectIdPath(id): ObjectIdPath,
    form: ImageForm<UpdateUser>,
) -> UserResult<Success<UserData>> {
    let user = service.update_user(id, form.data, form.image).await?;
    Ok(Success::new(UserData { user }))
}

/// Delete a user and its avatar
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Users",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "User removed", body = Success<Empty>),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn delete_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    ObjectIdPath(id): ObjectIdPath,
) -> UserResult<Success<Empty>> {
    service.delete_user(id).await?;
    Ok(Success::new(Empty {}))
}

#[utoipa::path(
    put,
    path = "/password/{id}",
    tag = "Users",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "User id")),
    request_body = SetPassword,
    responses(
        (status = 200, description = "Password replaced", body = Success<UserData>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn set_password<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    ObjectIdPath(id): ObjectIdPath,
    ValidatedJson(input): ValidatedJson<SetPassword>,
) -> UserResult<Success<UserData>> {
    let user = service.set_password(id, input).await?;
    Ok(Success::new(UserData { user }))
}
