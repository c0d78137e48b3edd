use super::NOT_AUTHORIZED;
use super::jwt::JwtAuth;
use super::principal::{CurrentUser, PrincipalStore, Role};
use crate::errors::AppError;
use axum::{
    Router,
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, header},
    middleware::{Next, from_fn_with_state},
    response::Response,
};
use core_config::Environment;
use mongodb::bson::oid::ObjectId;
use std::sync::Arc;

/// Cookie checked when no bearer header is sent.
pub const TOKEN_COOKIE: &str = "token";

/// Everything [`require_auth`] needs to turn a token into a [`CurrentUser`].
#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<JwtAuth>,
    pub principals: Arc<dyn PrincipalStore>,
}

impl AuthState {
    pub fn new(jwt: JwtAuth, principals: Arc<dyn PrincipalStore>) -> Self {
        Self {
            jwt: Arc::new(jwt),
            principals,
        }
    }
}

/// `Set-Cookie` value carrying a freshly issued token. `Secure` is added
/// outside development.
pub fn token_cookie(jwt: &JwtAuth, token: &str) -> Result<HeaderValue, AppError> {
    let secure = if Environment::from_env().is_development() {
        ""
    } else {
        " Secure;"
    };
    let cookie = format!(
        "{}={}; HttpOnly;{} SameSite=Strict; Path=/; Max-Age={}",
        TOKEN_COOKIE,
        token,
        secure,
        jwt.expires_in().num_seconds().max(0)
    );

    HeaderValue::from_str(&cookie)
        .map_err(|e| AppError::InternalServerError(format!("Failed to create cookie: {e}")))
}

/// Extract JWT from Authorization header or cookie
fn extract_token(headers: &HeaderMap) -> Option<String> {
    // Try Authorization header first: "Bearer <token>"
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .or_else(|| {
            headers
                .get(header::COOKIE)
                .and_then(|v| v.to_str().ok())
                .and_then(|cookies| {
                    cookies.split(';').find_map(|cookie| {
                        let (name, value) = cookie.trim().split_once('=')?;
                        (name == TOKEN_COOKIE && !value.is_empty()).then(|| value.to_string())
                    })
                })
        })
}

fn not_authorized() -> AppError {
    AppError::Forbidden(NOT_AUTHORIZED.to_string())
}

/// JWT authentication middleware
///
/// Verifies the token, loads the user it names and inserts the
/// [`CurrentUser`] into request extensions. Every failure answers 403.
pub async fn require_auth(
    State(auth): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(token) = extract_token(request.headers()) else {
        tracing::debug!("No JWT found in Authorization header or cookie");
        return Err(not_authorized());
    };

    let claims = auth.jwt.verify(&token).map_err(|e| {
        tracing::debug!("JWT verification failed: {}", e);
        not_authorized()
    })?;

    let id = ObjectId::parse_str(&claims.sub).map_err(|_| not_authorized())?;
    let user = auth.principals.find_principal(&id).await?.ok_or_else(|| {
        tracing::debug!(user_id = %id, "Token subject no longer exists");
        not_authorized()
    })?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Rejects callers whose role is not listed. Must run after [`require_auth`].
pub async fn role_guard(
    State(roles): State<&'static [Role]>,
    user: CurrentUser,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !roles.contains(&user.role) {
        return Err(AppError::Forbidden(format!(
            "User role {} is not authorized to access this route",
            user.role
        )));
    }
    Ok(next.run(request).await)
}

/// Put every route of `router` behind [`require_auth`] and, when `roles` is
/// non-empty, [`role_guard`].
pub fn protect<S>(router: Router<S>, auth: &AuthState, roles: &'static [Role]) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let router = if roles.is_empty() {
        router
    } else {
        router.route_layer(from_fn_with_state(roles, role_guard))
    };
    // Added last so it runs first
    router.route_layer(from_fn_with_state(auth.clone(), require_auth))
}
