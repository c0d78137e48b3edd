//! Public and self-service account endpoints mounted at `/auth`.

use axum::{
    Router,
    extract::{Path, State},
    http::header,
    response::{AppendHeaders, IntoResponse, Response},
    routing::{delete, get, post, put},
};
use axum_helpers::{
    AuthState, CurrentUser, Empty, ObjectIdPath, Success, ValidatedJson, created,
    errors::responses::{
        BadRequestValidationResponse, DuplicateKeyResponse, ForbiddenResponse,
        InternalServerErrorResponse, NotFoundResponse,
    },
    protect, token_cookie,
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::UserResult;
use crate::models::{
    AuthData, ForgotPassword, LoginRequest, RegisterUser, ResetPassword, ResetTokenData,
    SummaryData, UpdatePassword, UpdateProfile, UserData,
};
use crate::repository::UserRepository;
use crate::service::UserService;

#[derive(OpenApi)]
#[openapi(
    paths(
        register,
        login,
        forgot_password,
        reset_password,
        get_profile,
        update_password,
        update_profile,
        delete_profile,
    ),
    components(
        schemas(
            RegisterUser, LoginRequest, UpdatePassword, UpdateProfile, ForgotPassword,
            ResetPassword, AuthData, UserData, SummaryData, ResetTokenData
        ),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            DuplicateKeyResponse,
            ForbiddenResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Auth", description = "Registration, login and the caller's own profile")
    )
)]
pub struct AuthApiDoc;

/// Public routes plus the self-service routes behind [`protect`].
pub fn auth_router<R: UserRepository + 'static>(
    service: Arc<UserService<R>>,
    auth: &AuthState,
) -> Router {
    let public = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/forgotpassword", post(forgot_password))
        .route("/resetpassword/{resettoken}", post(reset_password));

    let own = Router::new()
        .route("/getprofile", get(get_profile))
        .route("/updatepassword", put(update_password))
        .route("/updatedprofile", put(update_profile))
        .route("/deletedprofile/{id}", delete(delete_profile));

    public
        .merge(protect(own, auth, &[]))
        .with_state(service)
}

/// Token response with the token also set as the `token` cookie
fn token_response<R: UserRepository>(
    service: &UserService<R>,
    data: AuthData,
) -> UserResult<Response> {
    let cookie = token_cookie(service.jwt(), &data.token)?;
    Ok((AppendHeaders([(header::SET_COOKIE, cookie)]), Success::new(data)).into_response())
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/register",
    tag = "Auth",
    request_body = RegisterUser,
    responses(
        (status = 201, description = "Account created", body = Success<UserData>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 400, response = DuplicateKeyResponse)
    )
)]
async fn register<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    ValidatedJson(input): ValidatedJson<RegisterUser>,
) -> UserResult<impl IntoResponse> {
    let user = service.register(input).await?;
    Ok(created(UserData { user }))
}

/// Exchange credentials for a token
#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = Success<AuthData>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn login<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    ValidatedJson(input): ValidatedJson<LoginRequest>,
) -> UserResult<Response> {
    let data = service.login(input).await?;
    token_response(&service, data)
}

/// Start a password reset
///
/// Mail delivery is not wired; the plain token is returned to the caller.
#[utoipa::path(
    post,
    path = "/forgotpassword",
    tag = "Auth",
    request_body = ForgotPassword,
    responses(
        (status = 200, description = "Reset token issued", body = Success<ResetTokenData>),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn forgot_password<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    ValidatedJson(input): ValidatedJson<ForgotPassword>,
) -> UserResult<Success<ResetTokenData>> {
    let reset_token = service.forgot_password(&input.email).await?;
    Ok(Success::new(ResetTokenData { reset_token }))
}

/// Set a new password with a reset token
#[utoipa::path(
    post,
    path = "/resetpassword/{resettoken}",
    tag = "Auth",
    params(("resettoken" = String, Path, description = "Token from /forgotpassword")),
    request_body = ResetPassword,
    responses(
        (status = 200, description = "Password reset", body = Success<AuthData>),
        (status = 403, response = ForbiddenResponse)
    )
)]
async fn reset_password<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    Path(token): Path<String>,
    ValidatedJson(input): ValidatedJson<ResetPassword>,
) -> UserResult<Response> {
    let data = service.reset_password(&token, input).await?;
    token_response(&service, data)
}

/// The caller's profile
#[utoipa::path(
    get,
    path = "/getprofile",
    tag = "Auth",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Current user", body = Success<UserData>),
        (status = 403, response = ForbiddenResponse)
    )
)]
async fn get_profile<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    caller: CurrentUser,
) -> UserResult<Success<UserData>> {
    let user = service.profile(caller.id).await?;
    Ok(Success::new(UserData { user }))
}

#[utoipa::path(
    put,
    path = "/updatepassword",
    tag = "Auth",
    security(("bearer" = [])),
    request_body = UpdatePassword,
    responses(
        (status = 200, description = "Password changed", body = Success<SummaryData>),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn update_password<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    caller: CurrentUser,
    ValidatedJson(input): ValidatedJson<UpdatePassword>,
) -> UserResult<Success<SummaryData>> {
    let user = service.update_password(caller.id, input).await?;
    Ok(Success::new(SummaryData { user }))
}

#[utoipa::path(
    put,
    path = "/updatedprofile",
    tag = "Auth",
    security(("bearer" = [])),
    request_body = UpdateProfile,
    responses(
        (status = 200, description = "Profile updated", body = Success<SummaryData>),
        (status = 400, response = BadRequestValidationResponse)
    )
)]
async fn update_profile<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    caller: CurrentUser,
    ValidatedJson(input): ValidatedJson<UpdateProfile>,
) -> UserResult<Success<SummaryData>> {
    let user = service.update_profile(caller.id, input).await?;
    Ok(Success::new(SummaryData { user }))
}

/// Delete an account; callers may delete only their own unless admin
#[utoipa::path(
    delete,
    path = "/deletedprofile/{id}",
    tag = "Auth",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Account removed", body = Success<Empty>),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn delete_profile<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    caller: CurrentUser,
    ObjectIdPath(id): ObjectIdPath,
) -> UserResult<Success<Empty>> {
    service.delete_profile(&caller, id).await?;
    Ok(Success::new(Empty {}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::list_schema;
    use crate::principal::UserPrincipals;
    use crate::repository::InMemoryUserRepository;
    use advanced_results::{AdvancedResults, MemoryDocumentSource};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use axum_helpers::{ImageStore, JwtAuth, JwtConfig, UploadConfig};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    struct TestApp {
        app: Router,
        _dir: tempfile::TempDir,
    }

    fn setup() -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let jwt = JwtAuth::new(&JwtConfig::new("this-is-a-valid-secret-with-32-chars!").unwrap());
        let listing = AdvancedResults::new(Arc::new(MemoryDocumentSource::new(vec![])), list_schema());
        let service = UserService::new(
            InMemoryUserRepository::new(),
            Arc::new(jwt.clone()),
            listing,
            ImageStore::new(UploadConfig::new(dir.path())),
        );
        let auth = AuthState::new(jwt, Arc::new(service.principals()));
        TestApp {
            app: auth_router(Arc::new(service), &auth),
            _dir: dir,
        }
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    fn registration(email: &str) -> Value {
        json!({
            "name": "Ann",
            "email": email,
            "password": "secret1",
            "confirmPassword": "secret1",
            "role": "publisher"
        })
    }

    async fn register_and_login(app: &Router, email: &str) -> (String, String) {
        let (status, body) = send(app, "POST", "/register", None, Some(registration(email))).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["data"]["user"]["_id"].as_str().unwrap().to_string();

        let (status, body) = send(
            app,
            "POST",
            "/login",
            None,
            Some(json!({ "email": email, "password": "secret1" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        (id, body["data"]["token"].as_str().unwrap().to_string())
    }

    #[tokio::test]
    async fn test_register_login_profile() {
        let TestApp { app, _dir } = setup();
        let (id, token) = register_and_login(&app, "ann@example.com").await;

        let (status, body) = send(&app, "GET", "/getprofile", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["user"]["_id"], id);
        assert_eq!(body["data"]["user"]["role"], "publisher");
        assert!(body["data"]["user"].get("password").is_none());
    }

    #[tokio::test]
    async fn test_login_sets_cookie() {
        let TestApp { app, _dir } = setup();
        send(&app, "POST", "/register", None, Some(registration("ann@example.com"))).await;

        let request = Request::builder()
            .method("POST")
            .uri("/login")
            .header("content-type", "application/json")
            .body(Body::from(
                json!({ "email": "ann@example.com", "password": "secret1" }).to_string(),
            ))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        let cookie = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.starts_with("token="));
        assert!(cookie.contains("HttpOnly"));
    }

    #[tokio::test]
    async fn test_register_validation_and_duplicates() {
        let TestApp { app, _dir } = setup();

        let mut body = registration("ann@example.com");
        body["confirmPassword"] = json!("different");
        let (status, json) = send(&app, "POST", "/register", None, Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            json["data"]["message"],
            "Password confirmation does not match password"
        );

        send(&app, "POST", "/register", None, Some(registration("ann@example.com"))).await;
        let (status, json) =
            send(&app, "POST", "/register", None, Some(registration("ann@example.com"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn test_login_failures_are_not_found() {
        let TestApp { app, _dir } = setup();
        send(&app, "POST", "/register", None, Some(registration("ann@example.com"))).await;

        let (status, json) = send(
            &app,
            "POST",
            "/login",
            None,
            Some(json!({ "email": "ann@example.com", "password": "wrong-1" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["data"]["message"], "Password is incorrect");

        let (status, _) = send(
            &app,
            "POST",
            "/login",
            None,
            Some(json!({ "email": "bob@example.com", "password": "secret1" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_protected_routes_need_token() {
        let TestApp { app, _dir } = setup();

        let (status, json) = send(&app, "GET", "/getprofile", None, None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["data"]["message"], "Not authorized to access this route");

        let (status, _) = send(&app, "GET", "/getprofile", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_update_password_and_profile() {
        let TestApp { app, _dir } = setup();
        let (_, token) = register_and_login(&app, "ann@example.com").await;

        let (status, json) = send(
            &app,
            "PUT",
            "/updatepassword",
            Some(&token),
            Some(json!({ "currentPassword": "secret1", "newPassword": "another1" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["user"]["email"], "ann@example.com");

        let (status, json) = send(
            &app,
            "PUT",
            "/updatedprofile",
            Some(&token),
            Some(json!({ "name": "Ann B", "email": "annb@example.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["user"]["name"], "Ann B");

        let (status, _) = send(
            &app,
            "POST",
            "/login",
            None,
            Some(json!({ "email": "annb@example.com", "password": "another1" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_delete_profile_of_someone_else_is_forbidden() {
        let TestApp { app, _dir } = setup();
        let (ann_id, ann_token) = register_and_login(&app, "ann@example.com").await;
        let (bob_id, bob_token) = register_and_login(&app, "bob@example.com").await;

        let (status, _) = send(
            &app,
            "DELETE",
            &format!("/deletedprofile/{ann_id}"),
            Some(&bob_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, json) = send(
            &app,
            "DELETE",
            &format!("/deletedprofile/{bob_id}"),
            Some(&bob_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!({ "success": true, "data": {} }));

        // The token outlives the account but no longer authenticates
        let (status, _) = send(&app, "GET", "/getprofile", Some(&bob_token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = send(&app, "GET", "/getprofile", Some(&ann_token), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_forgot_and_reset_password_flow() {
        let TestApp { app, _dir } = setup();
        send(&app, "POST", "/register", None, Some(registration("ann@example.com"))).await;

        let (status, json) = send(
            &app,
            "POST",
            "/forgotpassword",
            None,
            Some(json!({ "email": "ann@example.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let reset_token = json["data"]["resetToken"].as_str().unwrap().to_string();
        assert_eq!(reset_token.len(), 40);

        let (status, json) = send(
            &app,
            "POST",
            &format!("/resetpassword/{reset_token}"),
            None,
            Some(json!({ "password": "brandnew" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["data"]["token"].is_string());

        let (status, json) = send(
            &app,
            "POST",
            &format!("/resetpassword/{reset_token}"),
            None,
            Some(json!({ "password": "brandnew" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["data"]["message"], "Token expire");
    }

    #[test]
    fn test_openapi_lists_auth_paths() {
        let doc = AuthApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/login"));
        assert!(doc.paths.paths.contains_key("/resetpassword/{resettoken}"));
    }
}
