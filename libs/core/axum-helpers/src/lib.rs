//! # Axum Helpers
//!
//! Shared building blocks for the catalog HTTP services.
//!
//! ## Modules
//!
//! - **[`auth`]**: JWT tokens, the current user, role guards
//! - **[`server`]**: Server setup, health checks, graceful shutdown
//! - **[`http`]**: HTTP middleware (CORS, security headers)
//! - **[`envelope`]**: The `{ success, data }` body
//! - **[`errors`]**: Structured error responses with error codes
//! - **[`extractors`]**: ObjectId paths, validated JSON, image forms
//! - **[`uploads`]**: Image validation and local storage
//!
//! ## Quick Start
//!
//! ```ignore
//! use axum::Router;
//! use axum_helpers::server::{create_app, create_router};
//! use core_config::server::ServerConfig;
//! use utoipa::OpenApi;
//!
//! #[derive(OpenApi)]
//! #[openapi(paths())]
//! struct ApiDoc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let api_routes = Router::new(); // Add your routes
//!     let router = create_router::<ApiDoc>(api_routes).await?;
//!
//!     let config = ServerConfig::default();
//!     create_app(router, &config).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod envelope;
pub mod errors;
pub mod extractors;
pub mod http;
pub mod server;
pub mod uploads;

// Re-export auth types
pub use auth::{
    AuthState, CurrentUser, JwtAuth, JwtClaims, JwtConfig, PrincipalStore, Role, TOKEN_COOKIE,
    protect, require_auth, role_guard, token_cookie,
};

// Re-export server types
pub use server::{
    HealthCheckFuture, HealthResponse, ShutdownCoordinator, create_app, create_production_app,
    create_router, health_router, ready_router, run_health_checks, shutdown_signal,
};

// Re-export HTTP middleware
pub use http::{cors_layer_from_env, create_cors_layer, security_headers};

pub use envelope::{Empty, Success, created};

// Re-export error types
pub use errors::{AppError, ErrorCode, ErrorResponse};

// Re-export extractors
pub use extractors::{ImageForm, ObjectIdPath, ValidatedJson};

pub use uploads::{ImageStore, UploadConfig, UploadedImage};
