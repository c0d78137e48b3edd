//! Authentication and authorization module.
//!
//! This module provides:
//! - JWT issuing and verification
//! - The authenticated [`CurrentUser`] and its [`Role`]
//! - Middleware that loads the caller and enforces role lists
//!
//! # Example
//!
//! ```ignore
//! use axum_helpers::auth::{AuthState, JwtAuth, JwtConfig, Role, protect};
//! use core_config::FromEnv;
//!
//! let jwt = JwtAuth::new(&JwtConfig::from_env()?);
//! let auth = AuthState::new(jwt, principals);
//!
//! const ADMIN: &[Role] = &[Role::Admin];
//! let routes = protect(Router::new().route("/", get(handler)), &auth, ADMIN);
//! ```

pub mod config;
pub mod jwt;
pub mod middleware;
pub mod principal;

pub use config::{DEFAULT_JWT_EXPIRE, JwtConfig, parse_expiry};
pub use jwt::{JwtAuth, JwtClaims, JwtError};
pub use middleware::{AuthState, TOKEN_COOKIE, protect, require_auth, role_guard, token_cookie};
pub use principal::{CurrentUser, PrincipalStore, Role};

/// Message for every failed authentication.
pub const NOT_AUTHORIZED: &str = "Not authorized to access this route";
